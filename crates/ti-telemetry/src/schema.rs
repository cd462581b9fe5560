//! Arrow schemas for ingested tables.
//!
//! Every table is derived from a stream's resolved columns. Rows are always
//! complete, so no column is nullable.

use arrow::datatypes::{DataType, Field, Schema, SchemaRef, TimeUnit};
use std::sync::Arc;
use ti_common::StorageType;

/// Timezone attached to every timestamp column.
pub const TIMESTAMP_TZ: &str = "UTC";

/// Name and storage category of one output column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: String,
    pub storage: StorageType,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, storage: StorageType) -> Self {
        ColumnSpec {
            name: name.into(),
            storage,
        }
    }
}

/// Arrow type used for a storage category.
pub fn arrow_type(storage: StorageType) -> DataType {
    match storage {
        StorageType::Int32 => DataType::Int32,
        StorageType::Int64 => DataType::Int64,
        StorageType::Float32 => DataType::Float32,
        StorageType::Float64 => DataType::Float64,
        StorageType::Text => DataType::Utf8,
        StorageType::DateTime => DataType::Timestamp(TimeUnit::Nanosecond, Some(TIMESTAMP_TZ.into())),
    }
}

/// Build the Arrow schema for a table.
pub fn table_schema(columns: &[ColumnSpec]) -> SchemaRef {
    let fields: Vec<Field> = columns
        .iter()
        .map(|c| Field::new(&c.name, arrow_type(c.storage), false))
        .collect();
    Arc::new(Schema::new(fields))
}
