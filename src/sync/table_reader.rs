//! Live-table bulk extraction.

use crate::config::SinkConfig;
use crate::error::Result;
use crate::records::TableRecords;
use crate::sql;
use tokio_postgres::Transaction;
use tracing::debug;

/// Full scan of the live nested-set table. Payload columns are preserved
/// positionally; only the primary key and the two coordinates are
/// interpreted downstream.
pub struct NestedSetTableReader<'a> {
    config: &'a SinkConfig,
}

impl<'a> NestedSetTableReader<'a> {
    pub fn new(config: &'a SinkConfig) -> Self {
        NestedSetTableReader { config }
    }

    pub async fn read_all(&self, txn: &Transaction<'_>) -> Result<TableRecords> {
        let query = sql::build_full_select(&self.config.table_name);
        debug!("Using live table SELECT query: {query}");
        let statement = txn.prepare(&query).await?;
        let rows = txn.query(&statement, &[]).await?;
        TableRecords::from_query(&statement, &rows)
    }
}
