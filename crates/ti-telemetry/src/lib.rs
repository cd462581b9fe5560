//! Telemetry ingest columnar storage.
//!
//! This crate provides:
//! - Arrow schema construction from resolved table columns
//! - Batched Parquet writer with compression, one file per table per run
//! - Path layout helpers

pub mod schema;
pub mod writer;

pub use schema::{arrow_type, table_schema, ColumnSpec};
pub use writer::{BatchedWriter, Compression, WriteError, WriterConfig};

/// Default batch size for buffered writes.
pub const DEFAULT_BATCH_SIZE: usize = 1000;
