//! Error types for the nested-set sink.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("the table {table} doesn't contain the expected column {column}")]
    MissingColumn { table: String, column: String },

    #[error("null value in the {column} column of the table {table}")]
    NullKey { table: String, column: String },

    #[error("invalid operation type {code} retrieved for the ID {node_id} in the table {table}")]
    UnknownOperation {
        code: i32,
        node_id: i64,
        table: String,
    },

    #[error("unsupported column type {ty} in column {column}")]
    UnsupportedColumnType { column: String, ty: String },

    #[error("invalid sink configuration: {0}")]
    InvalidConfig(String),

    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, SinkError>;
