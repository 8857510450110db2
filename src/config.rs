//! Sink configuration.
//!
//! The destination table, log table and offset table names are configurable
//! per deployment, together with the column names the synchronizer needs to
//! recognize and the operation codes the log producer writes. Configuration
//! is loaded from a YAML file keyed with the connector-style dotted names.

use crate::error::{Result, SinkError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Table and column naming plus operation-code mapping for one destination.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SinkConfig {
    /// Live nested-set table.
    #[serde(rename = "table.name")]
    pub table_name: String,

    #[serde(rename = "table.pk.column", default = "default_table_pk_column")]
    pub table_pk_column: String,

    #[serde(rename = "table.left.column", default = "default_table_left_column")]
    pub table_left_column: String,

    #[serde(rename = "table.right.column", default = "default_table_right_column")]
    pub table_right_column: String,

    /// Append-only log table the upstream writer fills.
    #[serde(rename = "log.table.name")]
    pub log_table_name: String,

    #[serde(rename = "log.table.pk.column", default = "default_log_table_pk_column")]
    pub log_table_pk_column: String,

    #[serde(
        rename = "log.table.operation.column",
        default = "default_log_table_operation_column"
    )]
    pub log_table_operation_column: String,

    /// Singleton offset row per log table lives here.
    #[serde(
        rename = "log.offset.table.name",
        default = "default_log_offset_table_name"
    )]
    pub log_offset_table_name: String,

    #[serde(
        rename = "log.offset.table.logtable.column",
        default = "default_log_offset_table_logtable_column"
    )]
    pub log_offset_table_logtable_column: String,

    #[serde(
        rename = "log.offset.table.offset.column",
        default = "default_log_offset_table_offset_column"
    )]
    pub log_offset_table_offset_column: String,

    /// Operation code the producer writes for create-or-replace intents.
    #[serde(rename = "operation.type.upsert", default = "default_operation_type_upsert")]
    pub operation_type_upsert: i32,

    /// Operation code the producer writes for delete intents.
    #[serde(rename = "operation.type.delete", default = "default_operation_type_delete")]
    pub operation_type_delete: i32,
}

fn default_table_pk_column() -> String {
    "id".to_string()
}

fn default_table_left_column() -> String {
    "lft".to_string()
}

fn default_table_right_column() -> String {
    "rgt".to_string()
}

fn default_log_table_pk_column() -> String {
    "log_id".to_string()
}

fn default_log_table_operation_column() -> String {
    "operation_type".to_string()
}

fn default_log_offset_table_name() -> String {
    "nested_set_sync_log_offset".to_string()
}

fn default_log_offset_table_logtable_column() -> String {
    "log_table_name".to_string()
}

fn default_log_offset_table_offset_column() -> String {
    "log_table_offset".to_string()
}

fn default_operation_type_upsert() -> i32 {
    0
}

fn default_operation_type_delete() -> i32 {
    1
}

impl SinkConfig {
    /// Load and validate a configuration from a YAML file.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<SinkConfig> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Parse and validate a configuration from YAML text.
    pub fn from_yaml(contents: &str) -> Result<SinkConfig> {
        let config: SinkConfig = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        for (key, value) in [
            ("table.name", &self.table_name),
            ("log.table.name", &self.log_table_name),
            ("log.offset.table.name", &self.log_offset_table_name),
        ] {
            if value.trim().is_empty() {
                return Err(SinkError::InvalidConfig(format!("{key} must not be empty")));
            }
        }
        if self.operation_type_upsert == self.operation_type_delete {
            return Err(SinkError::InvalidConfig(format!(
                "operation.type.upsert and operation.type.delete are both {}",
                self.operation_type_upsert
            )));
        }
        Ok(())
    }
}

/// Parse a duration string like "1h", "30m", "300s", "300" into seconds.
pub fn parse_duration_to_secs(s: &str) -> Result<i64> {
    let s = s.trim();
    if s.is_empty() {
        return Err(SinkError::InvalidConfig("empty duration string".to_string()));
    }

    let (number, multiplier) = if let Some(rest) = s.strip_suffix('h') {
        (rest, 3600)
    } else if let Some(rest) = s.strip_suffix('m') {
        (rest, 60)
    } else if let Some(rest) = s.strip_suffix('s') {
        (rest, 1)
    } else {
        (s, 1)
    };

    number
        .parse::<i64>()
        .map(|n| n * multiplier)
        .map_err(|_| SinkError::InvalidConfig(format!("invalid duration value: {s}")))
}
