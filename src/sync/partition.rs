//! Insert/update/delete partitioning.

use crate::error::{Result, SinkError};
use crate::records::LogColumns;
use crate::value::SqlValue;
use std::collections::HashSet;

/// Surviving log entries split by the statement that will apply them.
#[derive(Debug, Default)]
pub struct RecordPartitions {
    pub inserts: Vec<Vec<SqlValue>>,
    pub updates: Vec<Vec<SqlValue>>,
    pub deletes: Vec<Vec<SqlValue>>,
}

/// Split survivors by operation and live-table membership. A delete for a
/// node the live table doesn't hold still lands in `deletes`; the DELETE
/// statement is a no-op for it.
pub fn partition(
    survivors: Vec<Vec<SqlValue>>,
    live_ids: &HashSet<i64>,
    columns: &LogColumns,
    upsert_code: i32,
    delete_code: i32,
) -> Result<RecordPartitions> {
    let mut partitions = RecordPartitions::default();
    for row in survivors {
        let operation = columns.operation(&row)?;
        let node_id = columns.node_id(&row)?;
        if operation == delete_code {
            partitions.deletes.push(row);
        } else if operation == upsert_code {
            if live_ids.contains(&node_id) {
                partitions.updates.push(row);
            } else {
                partitions.inserts.push(row);
            }
        } else {
            return Err(SinkError::UnknownOperation {
                code: operation,
                node_id,
                table: columns.table().to_string(),
            });
        }
    }
    Ok(partitions)
}
