//! Log entry deduplication.

use crate::error::Result;
use crate::records::LogColumns;
use crate::value::SqlValue;
use std::collections::HashMap;

/// Collapse pending entries to the latest one per node id.
///
/// Within one cycle only the last intent for a node matters; intermediate
/// states may violate the nested-set invariant and must never reach the
/// live table. Survivor ordering is unspecified.
pub fn deduplicate(
    rows: Vec<Vec<SqlValue>>,
    columns: &LogColumns,
) -> Result<Vec<Vec<SqlValue>>> {
    let mut latest: HashMap<i64, Vec<SqlValue>> = HashMap::new();
    for row in rows {
        let node_id = columns.node_id(&row)?;
        let log_id = columns.log_id(&row)?;
        let supersedes = match latest.get(&node_id) {
            Some(existing) => columns.log_id(existing)? < log_id,
            None => true,
        };
        if supersedes {
            latest.insert(node_id, row);
        }
    }
    Ok(latest.into_values().collect())
}
