//! Transactional application of a cycle's changes.
//!
//! Everything here runs on the cycle's transaction, in a fixed statement
//! order: offset upsert, inserts, updates, deletes. A parent must never be
//! gone while a child that outlives it in the same cycle is being written,
//! so deletes always run last. Statements are prepared once and executed
//! per row.

use crate::config::SinkConfig;
use crate::error::Result;
use crate::records::LogColumns;
use crate::sql;
use crate::sync::partition::RecordPartitions;
use crate::value::SqlValue;
use tokio_postgres::types::ToSql;
use tokio_postgres::Transaction;
use tracing::{debug, info};

pub struct Applier<'a> {
    config: &'a SinkConfig,
}

impl<'a> Applier<'a> {
    pub fn new(config: &'a SinkConfig) -> Self {
        Applier { config }
    }

    /// Apply one cycle's partitions and advance the offset, in statement
    /// order: offset, inserts, updates, deletes.
    pub async fn apply(
        &self,
        txn: &Transaction<'_>,
        log_column_names: &[String],
        columns: &LogColumns,
        partitions: &RecordPartitions,
        latest_log_id: i64,
    ) -> Result<()> {
        info!(
            "Applying nested set table updates to the table {} with contents from the table {}",
            self.config.table_name, self.config.log_table_name
        );

        self.upsert_log_offset(txn, latest_log_id).await?;
        self.insert_new_nodes(txn, log_column_names, columns, &partitions.inserts)
            .await?;
        self.update_existing_nodes(txn, log_column_names, columns, &partitions.updates)
            .await?;
        self.delete_nodes(txn, columns, &partitions.deletes).await?;
        Ok(())
    }

    /// Record that every fetched entry up to `latest_log_id` has been
    /// absorbed, including superseded ones that produced no row change.
    async fn upsert_log_offset(&self, txn: &Transaction<'_>, latest_log_id: i64) -> Result<()> {
        let query = sql::build_offset_upsert(
            &self.config.log_offset_table_name,
            &self.config.log_offset_table_logtable_column,
            &self.config.log_offset_table_offset_column,
        );
        debug!(
            "Updating log offset table {} to {latest_log_id}",
            self.config.log_offset_table_name
        );
        txn.execute(&query, &[&self.config.log_table_name, &latest_log_id])
            .await?;
        Ok(())
    }

    /// New nodes are written with every log column except the log id and
    /// the operation code, payload included.
    async fn insert_new_nodes(
        &self,
        txn: &Transaction<'_>,
        log_column_names: &[String],
        columns: &LogColumns,
        rows: &[Vec<SqlValue>],
    ) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }

        let excluded = [columns.log_id_index(), columns.operation_index()];
        let mut insert_columns: Vec<&str> = Vec::new();
        let mut value_indexes: Vec<usize> = Vec::new();
        for (index, name) in log_column_names.iter().enumerate() {
            if !excluded.contains(&index) {
                insert_columns.push(name.as_str());
                value_indexes.push(index);
            }
        }

        let query = sql::build_insert(&self.config.table_name, &insert_columns);
        debug!("Using INSERT SQL query: {query}");
        let statement = txn.prepare(&query).await?;
        for row in rows {
            let params: Vec<&(dyn ToSql + Sync)> = value_indexes
                .iter()
                .map(|&index| &row[index] as &(dyn ToSql + Sync))
                .collect();
            txn.execute(&statement, &params).await?;
        }
        Ok(())
    }

    /// Existing nodes are rewritten column by column, keyed on the node id.
    async fn update_existing_nodes(
        &self,
        txn: &Transaction<'_>,
        log_column_names: &[String],
        columns: &LogColumns,
        rows: &[Vec<SqlValue>],
    ) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }

        let excluded = [
            columns.log_id_index(),
            columns.operation_index(),
            columns.node_id_index(),
        ];
        let mut update_columns: Vec<&str> = Vec::new();
        let mut value_indexes: Vec<usize> = Vec::new();
        for (index, name) in log_column_names.iter().enumerate() {
            if !excluded.contains(&index) {
                update_columns.push(name.as_str());
                value_indexes.push(index);
            }
        }

        let query = sql::build_update(
            &self.config.table_name,
            &self.config.table_pk_column,
            &update_columns,
        );
        debug!("Using UPDATE SQL query: {query}");
        let statement = txn.prepare(&query).await?;
        for row in rows {
            let mut params: Vec<&(dyn ToSql + Sync)> = value_indexes
                .iter()
                .map(|&index| &row[index] as &(dyn ToSql + Sync))
                .collect();
            params.push(&row[columns.node_id_index()]);
            txn.execute(&statement, &params).await?;
        }
        Ok(())
    }

    async fn delete_nodes(
        &self,
        txn: &Transaction<'_>,
        columns: &LogColumns,
        rows: &[Vec<SqlValue>],
    ) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }

        let query = sql::build_delete(&self.config.table_name, &self.config.table_pk_column);
        debug!("Using DELETE SQL query: {query}");
        let statement = txn.prepare(&query).await?;
        for row in rows {
            txn.execute(&statement, &[&row[columns.node_id_index()]])
                .await?;
        }
        Ok(())
    }
}
