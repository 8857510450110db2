//! Cycle orchestration.
//!
//! One [`Synchronizer::synchronize`] call is one cycle: read pending log
//! entries, deduplicate, validate, partition, apply, advance the offset,
//! commit. Any validation failure turns the cycle into a logged no-op so a
//! later cycle can retry once further log entries arrive.

pub mod apply;
pub mod dedupe;
pub mod log_reader;
pub mod partition;
pub mod table_reader;
pub mod validate;

use crate::config::SinkConfig;
use crate::error::Result;
use crate::records::{LogColumns, NodeColumns, TableRecords};
use crate::tree;
use apply::Applier;
use log_reader::LogTableReader;
use std::collections::HashSet;
use table_reader::NestedSetTableReader;
use tokio_postgres::{Client, Transaction};
use tracing::{info, warn};

/// What one cycle did, so callers can distinguish no-ops without parsing
/// logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// No log entries past the committed offset.
    NoPending,
    /// A pending entry or live row had missing or inverted coordinates.
    SkippedInvalidCoordinates,
    /// The projected state is not a valid nested-set forest.
    SkippedInvalidForest,
    /// Changes were applied and the offset advanced.
    Applied {
        inserted: usize,
        updated: usize,
        deleted: usize,
        offset: i64,
    },
}

pub struct Synchronizer {
    config: SinkConfig,
}

impl Synchronizer {
    pub fn new(config: SinkConfig) -> Self {
        Synchronizer { config }
    }

    pub fn config(&self) -> &SinkConfig {
        &self.config
    }

    /// Run one cycle in its own transaction. The transaction commits only
    /// when changes were applied; no-op cycles leave no trace.
    pub async fn synchronize(&self, client: &mut Client) -> Result<SyncOutcome> {
        let txn = client.transaction().await?;
        let outcome = self.synchronize_in(&txn).await?;
        if matches!(outcome, SyncOutcome::Applied { .. }) {
            txn.commit().await?;
        }
        Ok(outcome)
    }

    /// Run one cycle inside an externally owned transaction, for callers
    /// that commit the log append and the synchronization together.
    pub async fn synchronize_in(&self, txn: &Transaction<'_>) -> Result<SyncOutcome> {
        let log_reader = LogTableReader::new(&self.config);
        let offset = log_reader.read_offset(txn).await?;
        let pending = log_reader.read_pending(txn, offset).await?;
        info!(
            "Outstanding nested set log entries in the table {} to be synchronized: {}",
            self.config.log_table_name,
            pending.len()
        );
        if pending.is_empty() {
            return Ok(SyncOutcome::NoPending);
        }

        let log_columns = LogColumns::locate(&pending, &self.config)?;

        // The offset anchor is the pre-dedup maximum: superseded entries
        // produce no row change but their effect is still absorbed.
        let mut latest_log_id = i64::MIN;
        for row in &pending.rows {
            latest_log_id = latest_log_id.max(log_columns.log_id(row)?);
        }

        let TableRecords {
            columns: log_column_names,
            rows: pending_rows,
        } = pending;

        let survivors = dedupe::deduplicate(pending_rows, &log_columns)?;
        info!(
            "Outstanding deduplicated nested set log entries in the table {} to be synchronized: {}",
            self.config.log_table_name,
            survivors.len()
        );

        if !validate::log_entries_well_formed(
            &survivors,
            &log_columns,
            self.config.operation_type_upsert,
        )? {
            warn!(
                "Skipping synchronization: pending entries of the table {} contain invalid nested set coordinates",
                self.config.log_table_name
            );
            return Ok(SyncOutcome::SkippedInvalidCoordinates);
        }

        let live = NestedSetTableReader::new(&self.config).read_all(txn).await?;
        let node_columns = NodeColumns::locate(&live, &self.config)?;
        if !validate::table_rows_well_formed(&live.rows, &node_columns)? {
            warn!(
                "Skipping synchronization: the table {} contains invalid nested set coordinates",
                self.config.table_name
            );
            return Ok(SyncOutcome::SkippedInvalidCoordinates);
        }

        let projected = validate::project_forest(
            &live.rows,
            &node_columns,
            &survivors,
            &log_columns,
            self.config.operation_type_upsert,
            self.config.operation_type_delete,
        )?;
        if tree::build_forest(&projected).is_none() {
            info!(
                "The pending entries from {} can't be synchronized because the resulting structure is not a nested set",
                self.config.log_table_name
            );
            return Ok(SyncOutcome::SkippedInvalidForest);
        }

        let mut live_ids = HashSet::with_capacity(live.rows.len());
        for row in &live.rows {
            live_ids.insert(node_columns.id(row)?);
        }

        let partitions = partition::partition(
            survivors,
            &live_ids,
            &log_columns,
            self.config.operation_type_upsert,
            self.config.operation_type_delete,
        )?;

        Applier::new(&self.config)
            .apply(txn, &log_column_names, &log_columns, &partitions, latest_log_id)
            .await?;

        let outcome = SyncOutcome::Applied {
            inserted: partitions.inserts.len(),
            updated: partitions.updates.len(),
            deleted: partitions.deletes.len(),
            offset: latest_log_id,
        };
        info!(
            "Applied nested set updates to the table {}: {} inserted, {} updated, {} deleted, offset advanced to {}",
            self.config.table_name,
            partitions.inserts.len(),
            partitions.updates.len(),
            partitions.deletes.len(),
            latest_log_id
        );
        Ok(outcome)
    }
}
