//! Logical types, storage categories and decoded scalar values.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ti_wire::Timestamp;

use crate::error::Error;

/// Scalar type of a column as named in stream attribute metadata.
///
/// Determines which decode operation reads the field. The name-to-type
/// mapping used at ingest time lives in the type registry, which may add
/// aliases on top of these canonical names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogicalType {
    Bool,
    Int32,
    Int64,
    Uint32,
    Uint64,
    /// Zig-zag encoded.
    Sint32,
    /// Zig-zag encoded.
    Sint64,
    Fixed32,
    Fixed64,
    Sfixed32,
    Sfixed64,
    Float,
    Double,
    String,
    Timestamp,
}

impl LogicalType {
    /// Every logical type, in declaration order.
    pub const ALL: [LogicalType; 15] = [
        LogicalType::Bool,
        LogicalType::Int32,
        LogicalType::Int64,
        LogicalType::Uint32,
        LogicalType::Uint64,
        LogicalType::Sint32,
        LogicalType::Sint64,
        LogicalType::Fixed32,
        LogicalType::Fixed64,
        LogicalType::Sfixed32,
        LogicalType::Sfixed64,
        LogicalType::Float,
        LogicalType::Double,
        LogicalType::String,
        LogicalType::Timestamp,
    ];

    /// Canonical name.
    pub fn name(self) -> &'static str {
        match self {
            LogicalType::Bool => "bool",
            LogicalType::Int32 => "int32",
            LogicalType::Int64 => "int64",
            LogicalType::Uint32 => "uint32",
            LogicalType::Uint64 => "uint64",
            LogicalType::Sint32 => "sint32",
            LogicalType::Sint64 => "sint64",
            LogicalType::Fixed32 => "fixed32",
            LogicalType::Fixed64 => "fixed64",
            LogicalType::Sfixed32 => "sfixed32",
            LogicalType::Sfixed64 => "sfixed64",
            LogicalType::Float => "float",
            LogicalType::Double => "double",
            LogicalType::String => "string",
            LogicalType::Timestamp => "timestamp",
        }
    }
}

impl FromStr for LogicalType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LogicalType::ALL
            .into_iter()
            .find(|t| t.name() == s)
            .ok_or_else(|| Error::invalid_type(s))
    }
}

impl fmt::Display for LogicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Column storage category in the tabular store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageType {
    Int32,
    Int64,
    Float32,
    Float64,
    /// Fixed-width text.
    Text,
    DateTime,
}

impl StorageType {
    /// Column type used in generated DDL.
    pub fn sql_type(self) -> &'static str {
        match self {
            StorageType::Int32 => "INT",
            StorageType::Int64 => "BIGINT",
            StorageType::Float32 => "FLOAT",
            StorageType::Float64 => "DOUBLE",
            StorageType::Text => "VARCHAR(255)",
            StorageType::DateTime => "DATETIME(6)",
        }
    }
}

impl fmt::Display for StorageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.sql_type())
    }
}

/// One decoded scalar.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int32(i32),
    Int64(i64),
    Uint32(u32),
    Uint64(u64),
    Float32(f32),
    Float64(f64),
    Text(String),
    Timestamp(Timestamp),
}

/// One complete row: a value per column, in schema order.
pub type Record = Vec<Value>;

impl Value {
    /// Storage category this value is written as.
    pub fn storage_type(&self) -> StorageType {
        match self {
            Value::Bool(_) | Value::Int32(_) => StorageType::Int32,
            Value::Int64(_) | Value::Uint32(_) | Value::Uint64(_) => StorageType::Int64,
            Value::Float32(_) => StorageType::Float32,
            Value::Float64(_) => StorageType::Float64,
            Value::Text(_) => StorageType::Text,
            Value::Timestamp(_) => StorageType::DateTime,
        }
    }

    /// Render as a SQL literal. Non-finite floats and timestamps outside
    /// the calendar range become `NULL`.
    pub fn to_sql_literal(&self) -> String {
        match self {
            Value::Bool(b) => (if *b { "1" } else { "0" }).to_string(),
            Value::Int32(v) => v.to_string(),
            Value::Int64(v) => v.to_string(),
            Value::Uint32(v) => v.to_string(),
            Value::Uint64(v) => v.to_string(),
            Value::Float32(v) if v.is_finite() => v.to_string(),
            Value::Float64(v) if v.is_finite() => v.to_string(),
            Value::Float32(_) | Value::Float64(_) => "NULL".to_string(),
            Value::Text(s) => format!("'{}'", s.replace('\\', "\\\\").replace('\'', "''")),
            Value::Timestamp(ts) => match ts.to_datetime() {
                Some(dt) => format!("'{}'", dt.format("%Y-%m-%d %H:%M:%S%.6f")),
                None => "NULL".to_string(),
            },
        }
    }

    /// Render as JSON. Timestamps become RFC 3339 strings.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Bool(b) => serde_json::Value::from(*b),
            Value::Int32(v) => serde_json::Value::from(*v),
            Value::Int64(v) => serde_json::Value::from(*v),
            Value::Uint32(v) => serde_json::Value::from(*v),
            Value::Uint64(v) => serde_json::Value::from(*v),
            Value::Float32(v) => serde_json::Value::from(f64::from(*v)),
            Value::Float64(v) => serde_json::Value::from(*v),
            Value::Text(s) => serde_json::Value::from(s.as_str()),
            Value::Timestamp(ts) => serde_json::Value::from(ts.to_string()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int32(v) => write!(f, "{}", v),
            Value::Int64(v) => write!(f, "{}", v),
            Value::Uint32(v) => write!(f, "{}", v),
            Value::Uint64(v) => write!(f, "{}", v),
            Value::Float32(v) => write!(f, "{}", v),
            Value::Float64(v) => write!(f, "{}", v),
            Value::Text(s) => write!(f, "{}", s),
            Value::Timestamp(ts) => write!(f, "{}", ts),
        }
    }
}
