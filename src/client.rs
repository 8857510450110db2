//! PostgreSQL client utilities.

use crate::error::Result;
use tokio_postgres::{Client, NoTls};
use tracing::error;

/// Create a new PostgreSQL client with connection handling.
///
/// The returned client is owned by the caller; the connection itself is
/// driven by a spawned task until the client is dropped.
pub async fn new_postgresql_client(connection_string: &str) -> Result<Client> {
    let (client, connection) = tokio_postgres::connect(connection_string, NoTls).await?;

    // Spawn connection handler
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            error!("PostgreSQL connection error: {e}");
        }
    });

    Ok(client)
}
