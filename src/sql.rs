//! PostgreSQL statement builders.
//!
//! The synchronizer decides which columns participate in each statement;
//! identifier quoting, placeholder numbering and upsert syntax live here.

/// Double-quote an identifier, doubling embedded quotes.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn column_list(columns: &[&str]) -> String {
    columns
        .iter()
        .map(|c| quote_identifier(c))
        .collect::<Vec<_>>()
        .join(", ")
}

/// `INSERT INTO t (c1, c2) VALUES ($1, $2)`
pub fn build_insert(table: &str, columns: &[&str]) -> String {
    let placeholders = (1..=columns.len())
        .map(|i| format!("${i}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_identifier(table),
        column_list(columns),
        placeholders
    )
}

/// `UPDATE t SET c1 = $1, c2 = $2 WHERE k = $3`
pub fn build_update(table: &str, key_column: &str, columns: &[&str]) -> String {
    let assignments = columns
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{} = ${}", quote_identifier(c), i + 1))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "UPDATE {} SET {} WHERE {} = ${}",
        quote_identifier(table),
        assignments,
        quote_identifier(key_column),
        columns.len() + 1
    )
}

/// `DELETE FROM t WHERE k = $1`
pub fn build_delete(table: &str, key_column: &str) -> String {
    format!(
        "DELETE FROM {} WHERE {} = $1",
        quote_identifier(table),
        quote_identifier(key_column)
    )
}

/// Offset-row upsert keyed by the log table name.
pub fn build_offset_upsert(table: &str, key_column: &str, offset_column: &str) -> String {
    let table = quote_identifier(table);
    let key = quote_identifier(key_column);
    let offset = quote_identifier(offset_column);
    format!(
        "INSERT INTO {table} ({key}, {offset}) VALUES ($1, $2) \
         ON CONFLICT ({key}) DO UPDATE SET {offset} = EXCLUDED.{offset}"
    )
}

/// Offset lookup for one log table; yields no row before the first sync.
pub fn build_offset_select(table: &str, key_column: &str, offset_column: &str) -> String {
    format!(
        "SELECT {} FROM {} WHERE {} = $1",
        quote_identifier(offset_column),
        quote_identifier(table),
        quote_identifier(key_column)
    )
}

/// Pending log entries strictly after the committed offset.
pub fn build_pending_select(log_table: &str, log_pk_column: &str) -> String {
    let pk = quote_identifier(log_pk_column);
    format!(
        "SELECT * FROM {} WHERE {pk} > $1 ORDER BY {pk}",
        quote_identifier(log_table)
    )
}

/// Full scan of the live table.
pub fn build_full_select(table: &str) -> String {
    format!("SELECT * FROM {}", quote_identifier(table))
}
