//! Pending log entry extraction.

use crate::config::SinkConfig;
use crate::error::Result;
use crate::records::TableRecords;
use crate::sql;
use tokio_postgres::Transaction;
use tracing::debug;

/// Reads the committed offset and the log rows past it, inside the cycle's
/// transaction.
pub struct LogTableReader<'a> {
    config: &'a SinkConfig,
}

impl<'a> LogTableReader<'a> {
    pub fn new(config: &'a SinkConfig) -> Self {
        LogTableReader { config }
    }

    /// Last committed offset for the configured log table. A missing offset
    /// row means no cycle has ever run, so processing starts from the
    /// beginning.
    pub async fn read_offset(&self, txn: &Transaction<'_>) -> Result<i64> {
        let query = sql::build_offset_select(
            &self.config.log_offset_table_name,
            &self.config.log_offset_table_logtable_column,
            &self.config.log_offset_table_offset_column,
        );
        let rows = txn.query(&query, &[&self.config.log_table_name]).await?;
        match rows.first() {
            Some(row) => Ok(row.try_get::<_, Option<i64>>(0)?.unwrap_or(0)),
            None => Ok(0),
        }
    }

    /// Every log row with a log id strictly above `offset`.
    pub async fn read_pending(&self, txn: &Transaction<'_>, offset: i64) -> Result<TableRecords> {
        let query = sql::build_pending_select(
            &self.config.log_table_name,
            &self.config.log_table_pk_column,
        );
        debug!("Using pending log SELECT query: {query}");
        let statement = txn.prepare(&query).await?;
        let rows = txn.query(&statement, &[&offset]).await?;
        TableRecords::from_query(&statement, &rows)
    }
}
