//! Tabular query results and captured column accessors.
//!
//! Both readers return the same shape: ordered column names plus positional
//! rows. The well-known columns (log id, operation code, node id, left and
//! right coordinates) are resolved once by case-insensitive name match and
//! then read through captured indices, so payload columns stay opaque.

use crate::config::SinkConfig;
use crate::error::{Result, SinkError};
use crate::value::SqlValue;
use tokio_postgres::{Row, Statement};

/// Ordered column names plus positional rows.
#[derive(Debug, Clone, Default)]
pub struct TableRecords {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<SqlValue>>,
}

impl TableRecords {
    /// Decode a query result. Column metadata comes from the prepared
    /// statement, so empty tables still yield their schema.
    pub fn from_query(statement: &Statement, rows: &[Row]) -> Result<TableRecords> {
        let columns = statement
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect();
        let mut decoded = Vec::with_capacity(rows.len());
        for row in rows {
            let mut cells = Vec::with_capacity(row.len());
            for index in 0..row.len() {
                cells.push(SqlValue::from_row(row, index)?);
            }
            decoded.push(cells);
        }
        Ok(TableRecords {
            columns,
            rows: decoded,
        })
    }

    /// Case-insensitive column lookup over the result's column names.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(name))
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }
}

#[derive(Debug, Clone)]
struct ColumnRef {
    index: usize,
    name: String,
}

fn locate_column(records: &TableRecords, table: &str, name: &str) -> Result<ColumnRef> {
    let index = records
        .column_index(name)
        .ok_or_else(|| SinkError::MissingColumn {
            table: table.to_string(),
            column: name.to_string(),
        })?;
    Ok(ColumnRef {
        index,
        name: name.to_string(),
    })
}

/// Captured column indices for a log-table result.
#[derive(Debug, Clone)]
pub struct LogColumns {
    table: String,
    log_id: ColumnRef,
    operation: ColumnRef,
    node_id: ColumnRef,
    left: ColumnRef,
    right: ColumnRef,
}

impl LogColumns {
    pub fn locate(records: &TableRecords, config: &SinkConfig) -> Result<LogColumns> {
        let table = &config.log_table_name;
        Ok(LogColumns {
            table: table.clone(),
            log_id: locate_column(records, table, &config.log_table_pk_column)?,
            operation: locate_column(records, table, &config.log_table_operation_column)?,
            node_id: locate_column(records, table, &config.table_pk_column)?,
            left: locate_column(records, table, &config.table_left_column)?,
            right: locate_column(records, table, &config.table_right_column)?,
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn log_id(&self, row: &[SqlValue]) -> Result<i64> {
        row[self.log_id.index]
            .as_i64()
            .ok_or_else(|| self.null_key(&self.log_id))
    }

    pub fn operation(&self, row: &[SqlValue]) -> Result<i32> {
        row[self.operation.index]
            .as_i32()
            .ok_or_else(|| self.null_key(&self.operation))
    }

    pub fn node_id(&self, row: &[SqlValue]) -> Result<i64> {
        row[self.node_id.index]
            .as_i64()
            .ok_or_else(|| self.null_key(&self.node_id))
    }

    /// `None` for NULL or non-integer cells; the validator decides whether
    /// that is acceptable.
    pub fn left(&self, row: &[SqlValue]) -> Option<i32> {
        row[self.left.index].as_i32()
    }

    pub fn right(&self, row: &[SqlValue]) -> Option<i32> {
        row[self.right.index].as_i32()
    }

    pub fn log_id_index(&self) -> usize {
        self.log_id.index
    }

    pub fn operation_index(&self) -> usize {
        self.operation.index
    }

    pub fn node_id_index(&self) -> usize {
        self.node_id.index
    }

    fn null_key(&self, column: &ColumnRef) -> SinkError {
        SinkError::NullKey {
            table: self.table.clone(),
            column: column.name.clone(),
        }
    }
}

/// Captured column indices for a live-table result.
#[derive(Debug, Clone)]
pub struct NodeColumns {
    table: String,
    id: ColumnRef,
    left: ColumnRef,
    right: ColumnRef,
}

impl NodeColumns {
    pub fn locate(records: &TableRecords, config: &SinkConfig) -> Result<NodeColumns> {
        let table = &config.table_name;
        Ok(NodeColumns {
            table: table.clone(),
            id: locate_column(records, table, &config.table_pk_column)?,
            left: locate_column(records, table, &config.table_left_column)?,
            right: locate_column(records, table, &config.table_right_column)?,
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn id(&self, row: &[SqlValue]) -> Result<i64> {
        row[self.id.index].as_i64().ok_or_else(|| SinkError::NullKey {
            table: self.table.clone(),
            column: self.id.name.clone(),
        })
    }

    pub fn left(&self, row: &[SqlValue]) -> Option<i32> {
        row[self.left.index].as_i32()
    }

    pub fn right(&self, row: &[SqlValue]) -> Option<i32> {
        row[self.right.index].as_i32()
    }
}
