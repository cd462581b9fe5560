//! Telemetry ingest common types, IDs, and errors.
//!
//! This crate provides foundational types shared across ti-core modules:
//! - Stream, table and ingestion identity types
//! - Logical types, storage categories and decoded scalar values
//! - Column schemas as delivered by a catalog
//! - Common error types
//! - Output format specifications

pub mod columns;
pub mod error;
pub mod id;
pub mod output;
pub mod schema;
pub mod types;

pub use columns::{ColumnDef, ColumnSchema, RESERVED_TABLE_COLUMN};
pub use error::{Error, Result};
pub use id::{IngestId, StreamId, TableName};
pub use output::{LogFormat, OutputFormat};
pub use schema::CATALOG_FORMAT_VERSION;
pub use types::{LogicalType, Record, StorageType, Value};
