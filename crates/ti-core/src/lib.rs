//! Telemetry ingest core.
//!
//! This crate provides:
//! - The logical type registry
//! - Column catalog and row sink capabilities, with in-memory and
//!   file-backed implementations
//! - The record ingester: wire buffers in, complete rows out
//! - Fixture encoding, logging setup, and CLI exit codes

pub mod catalog;
pub mod cli;
pub mod encode;
pub mod exit_codes;
pub mod ingest;
pub mod layout;
pub mod logging;
pub mod registry;
pub mod sink;

pub use catalog::{ColumnCatalog, InMemoryCatalog};
pub use encode::{encode_record, encode_records, row_from_json, value_from_json};
pub use exit_codes::ExitCode;
pub use ingest::{decode_record, IngestSummary, RecordIngester};
pub use layout::{ResolvedColumn, TableLayout};
pub use registry::{TypeInfo, TypeRegistry, TypeRegistryBuilder};
pub use sink::{CountingSink, JsonArraySink, JsonLinesSink, MemorySink, ParquetSink, RowSink};
