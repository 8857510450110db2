//! Dynamic SQL cell values.
//!
//! The log table carries arbitrary payload columns next to the well-known
//! ones, and those payload columns must be copied into the live table
//! without interpretation. Rows are therefore decoded positionally into
//! [`SqlValue`] cells, which pass back through `ToSql` when the applier
//! rewrites them as statement parameters.

use crate::error::{Result, SinkError};
use bytes::BytesMut;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use tokio_postgres::types::{to_sql_checked, IsNull, ToSql, Type};
use tokio_postgres::Row;

/// One cell of a log-table or live-table row.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    Numeric(Decimal),
    Text(String),
    Timestamp(NaiveDateTime),
    TimestampTz(DateTime<Utc>),
    Date(NaiveDate),
    Uuid(uuid::Uuid),
    Json(serde_json::Value),
    Bytes(Vec<u8>),
}

impl SqlValue {
    /// Decode the cell at `index`, dispatching on the column's PostgreSQL
    /// type. NULLs are preserved as [`SqlValue::Null`].
    pub fn from_row(row: &Row, index: usize) -> Result<SqlValue> {
        let column = &row.columns()[index];
        let pg_type = column.type_();

        let value = match *pg_type {
            Type::BOOL => row
                .try_get::<_, Option<bool>>(index)?
                .map_or(SqlValue::Null, SqlValue::Bool),
            Type::INT2 => row
                .try_get::<_, Option<i16>>(index)?
                .map_or(SqlValue::Null, SqlValue::Int16),
            Type::INT4 => row
                .try_get::<_, Option<i32>>(index)?
                .map_or(SqlValue::Null, SqlValue::Int32),
            Type::INT8 => row
                .try_get::<_, Option<i64>>(index)?
                .map_or(SqlValue::Null, SqlValue::Int64),
            Type::FLOAT4 => row
                .try_get::<_, Option<f32>>(index)?
                .map_or(SqlValue::Null, SqlValue::Float32),
            Type::FLOAT8 => row
                .try_get::<_, Option<f64>>(index)?
                .map_or(SqlValue::Null, SqlValue::Float64),
            Type::NUMERIC => row
                .try_get::<_, Option<Decimal>>(index)?
                .map_or(SqlValue::Null, SqlValue::Numeric),
            Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME => row
                .try_get::<_, Option<String>>(index)?
                .map_or(SqlValue::Null, SqlValue::Text),
            Type::TIMESTAMP => row
                .try_get::<_, Option<NaiveDateTime>>(index)?
                .map_or(SqlValue::Null, SqlValue::Timestamp),
            Type::TIMESTAMPTZ => row
                .try_get::<_, Option<DateTime<Utc>>>(index)?
                .map_or(SqlValue::Null, SqlValue::TimestampTz),
            Type::DATE => row
                .try_get::<_, Option<NaiveDate>>(index)?
                .map_or(SqlValue::Null, SqlValue::Date),
            Type::UUID => row
                .try_get::<_, Option<uuid::Uuid>>(index)?
                .map_or(SqlValue::Null, SqlValue::Uuid),
            Type::JSON | Type::JSONB => row
                .try_get::<_, Option<serde_json::Value>>(index)?
                .map_or(SqlValue::Null, SqlValue::Json),
            Type::BYTEA => row
                .try_get::<_, Option<Vec<u8>>>(index)?
                .map_or(SqlValue::Null, SqlValue::Bytes),
            _ => {
                // Unknown types survive as text when the driver allows it.
                match row.try_get::<_, Option<String>>(index) {
                    Ok(Some(s)) => SqlValue::Text(s),
                    Ok(None) => SqlValue::Null,
                    Err(_) => {
                        return Err(SinkError::UnsupportedColumnType {
                            column: column.name().to_string(),
                            ty: pg_type.to_string(),
                        })
                    }
                }
            }
        };

        Ok(value)
    }

    /// Integer read used for ids and log ids.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SqlValue::Int16(v) => Some(i64::from(*v)),
            SqlValue::Int32(v) => Some(i64::from(*v)),
            SqlValue::Int64(v) => Some(*v),
            _ => None,
        }
    }

    /// Integer read used for operation codes and nested-set coordinates.
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            SqlValue::Int16(v) => Some(i32::from(*v)),
            SqlValue::Int32(v) => Some(*v),
            SqlValue::Int64(v) => i32::try_from(*v).ok(),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }
}

impl ToSql for SqlValue {
    fn to_sql(
        &self,
        ty: &Type,
        out: &mut BytesMut,
    ) -> std::result::Result<IsNull, Box<dyn std::error::Error + Sync + Send>> {
        match self {
            SqlValue::Null => Ok(IsNull::Yes),
            SqlValue::Bool(v) => v.to_sql(ty, out),
            SqlValue::Int16(v) => v.to_sql(ty, out),
            SqlValue::Int32(v) => v.to_sql(ty, out),
            SqlValue::Int64(v) => v.to_sql(ty, out),
            SqlValue::Float32(v) => v.to_sql(ty, out),
            SqlValue::Float64(v) => v.to_sql(ty, out),
            SqlValue::Numeric(v) => v.to_sql(ty, out),
            SqlValue::Text(v) => v.to_sql(ty, out),
            SqlValue::Timestamp(v) => v.to_sql(ty, out),
            SqlValue::TimestampTz(v) => v.to_sql(ty, out),
            SqlValue::Date(v) => v.to_sql(ty, out),
            SqlValue::Uuid(v) => v.to_sql(ty, out),
            SqlValue::Json(v) => v.to_sql(ty, out),
            SqlValue::Bytes(v) => v.to_sql(ty, out),
        }
    }

    fn accepts(_ty: &Type) -> bool {
        // The target column type is only known at runtime; each variant's
        // inner to_sql still rejects genuine mismatches.
        true
    }

    to_sql_checked!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn as_i64_reads_all_integer_widths() {
        assert_eq!(SqlValue::Int16(7).as_i64(), Some(7));
        assert_eq!(SqlValue::Int32(7).as_i64(), Some(7));
        assert_eq!(SqlValue::Int64(7).as_i64(), Some(7));
    }

    #[test]
    fn as_i64_rejects_non_integers() {
        assert_eq!(SqlValue::Null.as_i64(), None);
        assert_eq!(SqlValue::Text("7".into()).as_i64(), None);
        assert_eq!(SqlValue::Float64(7.0).as_i64(), None);
    }

    #[test]
    fn as_i32_narrows_in_range_bigints() {
        assert_eq!(SqlValue::Int64(42).as_i32(), Some(42));
        assert_eq!(SqlValue::Int64(i64::from(i32::MAX) + 1).as_i32(), None);
    }

    #[test]
    fn null_detection() {
        assert!(SqlValue::Null.is_null());
        assert!(!SqlValue::Int32(0).is_null());
    }
}
