//! Nested-set validity checks.
//!
//! Two gates run before anything is written: per-row coordinate
//! well-formedness, and reconstructability of the projected forest. Both
//! failures are soft; the cycle becomes a no-op and is retried once later
//! log entries repair the picture.

use crate::error::{Result, SinkError};
use crate::records::{LogColumns, NodeColumns};
use crate::tree::Interval;
use crate::value::SqlValue;
use std::collections::HashMap;
use tracing::error;

fn is_well_formed(left: Option<i32>, right: Option<i32>) -> bool {
    matches!((left, right), (Some(l), Some(r)) if l < r)
}

/// Check every upsert survivor for present, ordered coordinates. Each
/// offender is logged; one bad row disqualifies the whole cycle.
pub fn log_entries_well_formed(
    rows: &[Vec<SqlValue>],
    columns: &LogColumns,
    upsert_code: i32,
) -> Result<bool> {
    let mut invalid_found = false;
    for row in rows {
        if columns.operation(row)? != upsert_code {
            continue;
        }
        if !is_well_formed(columns.left(row), columns.right(row)) {
            invalid_found = true;
            let id = columns.node_id(row)?;
            error!(
                "The entry with the ID {id} of the table {} contains invalid nested set coordinates",
                columns.table()
            );
        }
    }
    Ok(!invalid_found)
}

/// Same check over the live table; a corrupted destination also blocks the
/// cycle until an operator intervenes.
pub fn table_rows_well_formed(rows: &[Vec<SqlValue>], columns: &NodeColumns) -> Result<bool> {
    let mut invalid_found = false;
    for row in rows {
        if !is_well_formed(columns.left(row), columns.right(row)) {
            invalid_found = true;
            let id = columns.id(row)?;
            error!(
                "The entry with the ID {id} of the table {} contains invalid nested set coordinates",
                columns.table()
            );
        }
    }
    Ok(!invalid_found)
}

/// Coordinates of the hypothetical live table after applying every
/// surviving log entry: deletes remove the id, upserts insert or replace
/// it. An operation code outside the configured pair is fatal.
pub fn project_forest(
    live_rows: &[Vec<SqlValue>],
    node_columns: &NodeColumns,
    log_rows: &[Vec<SqlValue>],
    log_columns: &LogColumns,
    upsert_code: i32,
    delete_code: i32,
) -> Result<Vec<Interval>> {
    let mut nodes: HashMap<i64, Interval> = HashMap::new();

    for row in live_rows {
        let id = node_columns.id(row)?;
        if let (Some(left), Some(right)) = (node_columns.left(row), node_columns.right(row)) {
            nodes.insert(id, Interval::new(left, right));
        }
    }

    for row in log_rows {
        let operation = log_columns.operation(row)?;
        let node_id = log_columns.node_id(row)?;
        if operation == delete_code {
            nodes.remove(&node_id);
        } else if operation == upsert_code {
            if let (Some(left), Some(right)) = (log_columns.left(row), log_columns.right(row)) {
                nodes.insert(node_id, Interval::new(left, right));
            }
        } else {
            return Err(SinkError::UnknownOperation {
                code: operation,
                node_id,
                table: log_columns.table().to_string(),
            });
        }
    }

    Ok(nodes.into_values().collect())
}
