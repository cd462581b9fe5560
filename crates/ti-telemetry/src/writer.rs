//! Batched Parquet writer.
//!
//! Rows are buffered per table and written as one Arrow `RecordBatch` every
//! `batch_size` rows. Each table gets one file per run:
//!
//! ```text
//! <base_dir>/<table>/part-<ingest-id>.parquet
//! ```
//!
//! Values are widened into their column's storage category: bool becomes
//! 0/1, uint32 becomes i64, uint64 is reinterpreted as two's-complement i64,
//! timestamps become nanoseconds since the epoch.

use arrow::array::{
    ArrayRef, Float32Array, Float64Array, Int32Array, Int64Array, StringArray,
    TimestampNanosecondArray,
};
use arrow::datatypes::SchemaRef;
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression as ParquetCompression, ZstdLevel};
use parquet::errors::ParquetError;
use parquet::file::properties::WriterProperties;
use std::collections::BTreeMap;
use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use ti_common::{IngestId, Record, StorageType, TableName, Value};
use tracing::{debug, info};

use crate::schema::{table_schema, ColumnSpec, TIMESTAMP_TZ};
use crate::DEFAULT_BATCH_SIZE;

/// Errors from the Parquet writer.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] ParquetError),

    #[error("table {0} is not registered")]
    UnknownTable(String),

    #[error("table {table} re-registered with different columns")]
    SchemaChanged { table: String },

    #[error("table {table} expects {expected} values per row, got {found}")]
    ColumnCount {
        table: String,
        expected: usize,
        found: usize,
    },

    #[error("column {column} of {table} stores {expected}, got {found}")]
    TypeMismatch {
        table: String,
        column: String,
        expected: StorageType,
        found: StorageType,
    },

    #[error("timestamp in column {column} of {table} is outside the nanosecond range")]
    TimestampOutOfRange { table: String, column: String },
}

impl From<WriteError> for ti_common::Error {
    fn from(e: WriteError) -> Self {
        match e {
            WriteError::Io(io) => ti_common::Error::Io(io),
            WriteError::TypeMismatch { ref column, .. }
            | WriteError::TimestampOutOfRange { ref column, .. } => {
                ti_common::Error::ValueMismatch {
                    column: column.clone(),
                    reason: e.to_string(),
                }
            }
            other => ti_common::Error::Sink(other.to_string()),
        }
    }
}

/// Page compression codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    #[default]
    Zstd,
    Snappy,
    Uncompressed,
}

impl Compression {
    fn to_parquet(self) -> ParquetCompression {
        match self {
            Compression::Zstd => ParquetCompression::ZSTD(ZstdLevel::default()),
            Compression::Snappy => ParquetCompression::SNAPPY,
            Compression::Uncompressed => ParquetCompression::UNCOMPRESSED,
        }
    }
}

/// Writer configuration.
#[derive(Debug, Clone)]
pub struct WriterConfig {
    /// Root directory; one subdirectory per table.
    pub base_dir: PathBuf,

    /// Rows buffered per table before a batch is written.
    pub batch_size: usize,

    pub compression: Compression,

    /// Names the output files of this run.
    pub ingest_id: IngestId,
}

impl WriterConfig {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            batch_size: DEFAULT_BATCH_SIZE,
            compression: Compression::default(),
            ingest_id: IngestId::new(),
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    pub fn with_ingest_id(mut self, ingest_id: IngestId) -> Self {
        self.ingest_id = ingest_id;
        self
    }
}

struct TableState {
    columns: Vec<ColumnSpec>,
    schema: SchemaRef,
    pending: Vec<Record>,
    writer: Option<ArrowWriter<File>>,
    path: PathBuf,
    rows_written: u64,
}

impl TableState {
    fn flush(&mut self, table: &TableName, compression: Compression) -> Result<(), WriteError> {
        if self.pending.is_empty() {
            return Ok(());
        }

        let arrays: Vec<ArrayRef> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, col)| build_column(col.storage, &self.pending, i))
            .collect();
        let batch = RecordBatch::try_new(self.schema.clone(), arrays)?;

        let writer = match self.writer.take() {
            Some(w) => w,
            None => self.open_writer(compression)?,
        };
        let writer = self.writer.insert(writer);
        writer.write(&batch)?;

        self.rows_written += batch.num_rows() as u64;
        self.pending.clear();
        debug!(table = %table, rows = batch.num_rows(), "batch written");
        Ok(())
    }

    fn open_writer(&self, compression: Compression) -> Result<ArrowWriter<File>, WriteError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::create(&self.path)?;
        let props = WriterProperties::builder()
            .set_compression(compression.to_parquet())
            .build();
        Ok(ArrowWriter::try_new(file, self.schema.clone(), Some(props))?)
    }
}

/// Buffers rows per table and writes them to Parquet.
pub struct BatchedWriter {
    config: WriterConfig,
    tables: BTreeMap<TableName, TableState>,
}

impl BatchedWriter {
    pub fn new(config: WriterConfig) -> Self {
        Self {
            config,
            tables: BTreeMap::new(),
        }
    }

    pub fn config(&self) -> &WriterConfig {
        &self.config
    }

    /// Output file for a table in this run.
    pub fn table_path(&self, table: &TableName) -> PathBuf {
        self.config
            .base_dir
            .join(table.as_str())
            .join(format!("part-{}.parquet", self.config.ingest_id))
    }

    /// Declare a table's columns. Registering the same table again is a
    /// no-op when the columns match and an error otherwise.
    pub fn register_table(
        &mut self,
        table: &TableName,
        columns: Vec<ColumnSpec>,
    ) -> Result<(), WriteError> {
        if let Some(state) = self.tables.get(table) {
            if state.columns != columns {
                return Err(WriteError::SchemaChanged {
                    table: table.to_string(),
                });
            }
            return Ok(());
        }

        let path = self.table_path(table);
        let schema = table_schema(&columns);
        self.tables.insert(
            table.clone(),
            TableState {
                columns,
                schema,
                pending: Vec::new(),
                writer: None,
                path,
                rows_written: 0,
            },
        );
        Ok(())
    }

    /// Buffer one row; writes a batch once `batch_size` rows are pending.
    /// A row that does not fit the table's columns is rejected whole.
    pub fn append_row(&mut self, table: &TableName, row: &[Value]) -> Result<(), WriteError> {
        let batch_size = self.config.batch_size.max(1);
        let compression = self.config.compression;
        let state = self
            .tables
            .get_mut(table)
            .ok_or_else(|| WriteError::UnknownTable(table.to_string()))?;

        if row.len() != state.columns.len() {
            return Err(WriteError::ColumnCount {
                table: table.to_string(),
                expected: state.columns.len(),
                found: row.len(),
            });
        }
        for (col, value) in state.columns.iter().zip(row) {
            check_fits(table, col, value)?;
        }

        state.pending.push(row.to_vec());
        if state.pending.len() >= batch_size {
            state.flush(table, compression)?;
        }
        Ok(())
    }

    /// Write all pending rows.
    pub fn flush(&mut self) -> Result<(), WriteError> {
        let compression = self.config.compression;
        for (table, state) in self.tables.iter_mut() {
            state.flush(table, compression)?;
        }
        Ok(())
    }

    /// Flush and close every open file, returning the paths written.
    /// Tables that never received a row produce no file.
    pub fn finish(&mut self) -> Result<Vec<PathBuf>, WriteError> {
        self.flush()?;
        let mut paths = Vec::new();
        for (table, state) in self.tables.iter_mut() {
            if let Some(writer) = state.writer.take() {
                writer.close()?;
                info!(
                    table = %table,
                    rows = state.rows_written,
                    path = %state.path.display(),
                    "parquet file closed"
                );
                paths.push(state.path.clone());
            }
        }
        Ok(paths)
    }

    /// Rows written to files so far (excluding pending rows).
    pub fn rows_written(&self) -> u64 {
        self.tables.values().map(|s| s.rows_written).sum()
    }

    /// Rows buffered but not yet written.
    pub fn rows_pending(&self) -> usize {
        self.tables.values().map(|s| s.pending.len()).sum()
    }
}

fn check_fits(table: &TableName, col: &ColumnSpec, value: &Value) -> Result<(), WriteError> {
    let fits = match col.storage {
        StorageType::Int32 => as_i32(value).is_some(),
        StorageType::Int64 => as_i64(value).is_some(),
        StorageType::Float32 => as_f32(value).is_some(),
        StorageType::Float64 => as_f64(value).is_some(),
        StorageType::Text => as_str(value).is_some(),
        StorageType::DateTime => {
            if let Value::Timestamp(ts) = value {
                if ts.as_nanos().is_none() {
                    return Err(WriteError::TimestampOutOfRange {
                        table: table.to_string(),
                        column: col.name.clone(),
                    });
                }
                true
            } else {
                false
            }
        }
    };
    if fits {
        Ok(())
    } else {
        Err(WriteError::TypeMismatch {
            table: table.to_string(),
            column: col.name.clone(),
            expected: col.storage,
            found: value.storage_type(),
        })
    }
}

/// Build one Arrow column from buffered rows. Rows were checked on append,
/// so every value converts.
fn build_column(storage: StorageType, rows: &[Record], idx: usize) -> ArrayRef {
    let values = rows.iter().filter_map(move |row| row.get(idx));
    match storage {
        StorageType::Int32 => Arc::new(Int32Array::from_iter_values(values.filter_map(as_i32))),
        StorageType::Int64 => Arc::new(Int64Array::from_iter_values(values.filter_map(as_i64))),
        StorageType::Float32 => {
            Arc::new(Float32Array::from_iter_values(values.filter_map(as_f32)))
        }
        StorageType::Float64 => {
            Arc::new(Float64Array::from_iter_values(values.filter_map(as_f64)))
        }
        StorageType::Text => Arc::new(StringArray::from_iter_values(values.filter_map(as_str))),
        StorageType::DateTime => Arc::new(
            TimestampNanosecondArray::from_iter_values(values.filter_map(as_nanos))
                .with_timezone(TIMESTAMP_TZ),
        ),
    }
}

fn as_i32(value: &Value) -> Option<i32> {
    match value {
        Value::Int32(v) => Some(*v),
        Value::Bool(b) => Some(i32::from(*b)),
        _ => None,
    }
}

fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Int64(v) => Some(*v),
        Value::Uint32(v) => Some(i64::from(*v)),
        Value::Uint64(v) => Some(*v as i64),
        _ => None,
    }
}

fn as_f32(value: &Value) -> Option<f32> {
    match value {
        Value::Float32(v) => Some(*v),
        _ => None,
    }
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Float64(v) => Some(*v),
        _ => None,
    }
}

fn as_str(value: &Value) -> Option<&str> {
    match value {
        Value::Text(s) => Some(s.as_str()),
        _ => None,
    }
}

fn as_nanos(value: &Value) -> Option<i64> {
    match value {
        Value::Timestamp(ts) => ts.as_nanos(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::Array;
    use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
    use ti_wire::Timestamp;

    fn columns() -> Vec<ColumnSpec> {
        vec![
            ColumnSpec::new("host", StorageType::Text),
            ColumnSpec::new("up", StorageType::Int32),
            ColumnSpec::new("bytes", StorageType::Int64),
            ColumnSpec::new("load", StorageType::Float64),
            ColumnSpec::new("at", StorageType::DateTime),
        ]
    }

    fn row(host: &str, up: bool, bytes: u64, load: f64, secs: i64) -> Record {
        vec![
            Value::Text(host.to_string()),
            Value::Bool(up),
            Value::Uint64(bytes),
            Value::Float64(load),
            Value::Timestamp(Timestamp::new(secs, 0)),
        ]
    }

    fn read_batches(path: &std::path::Path) -> Vec<RecordBatch> {
        let file = File::open(path).unwrap();
        let reader = ParquetRecordBatchReaderBuilder::try_new(file)
            .unwrap()
            .build()
            .unwrap();
        reader.collect::<Result<Vec<_>, _>>().unwrap()
    }

    #[test]
    fn rows_roundtrip_through_parquet() {
        let dir = tempfile::tempdir().unwrap();
        let table = TableName::parse("hosts").unwrap();
        let mut writer = BatchedWriter::new(WriterConfig::new(dir.path()).with_batch_size(2));
        writer.register_table(&table, columns()).unwrap();

        writer.append_row(&table, &row("a", true, 10, 0.5, 100)).unwrap();
        writer.append_row(&table, &row("b", false, u64::MAX, 1.5, 200)).unwrap();
        assert_eq!(writer.rows_written(), 2);
        writer.append_row(&table, &row("c", true, 0, 2.5, 0)).unwrap();
        assert_eq!(writer.rows_pending(), 1);

        let paths = writer.finish().unwrap();
        assert_eq!(paths, vec![writer.table_path(&table)]);
        assert_eq!(writer.rows_written(), 3);

        let batches = read_batches(&paths[0]);
        let total: usize = batches.iter().map(|b| b.num_rows()).sum();
        assert_eq!(total, 3);

        let first = &batches[0];
        let hosts = first
            .column(0)
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();
        assert_eq!(hosts.value(0), "a");
        let up = first.column(1).as_any().downcast_ref::<Int32Array>().unwrap();
        assert_eq!(up.value(0), 1);
        assert_eq!(up.value(1), 0);
        let bytes = first.column(2).as_any().downcast_ref::<Int64Array>().unwrap();
        assert_eq!(bytes.value(1), -1);
        let at = first
            .column(4)
            .as_any()
            .downcast_ref::<TimestampNanosecondArray>()
            .unwrap();
        assert_eq!(at.value(0), 100_000_000_000);
    }

    #[test]
    fn path_layout_uses_table_and_ingest_id() {
        let id = IngestId::parse("ing-20260101-000000-abcdef").unwrap();
        let writer = BatchedWriter::new(WriterConfig::new("/data").with_ingest_id(id));
        let path = writer.table_path(&TableName::parse("cpu").unwrap());
        assert_eq!(
            path,
            PathBuf::from("/data/cpu/part-ing-20260101-000000-abcdef.parquet")
        );
    }

    #[test]
    fn mismatched_row_rejected_whole() {
        let dir = tempfile::tempdir().unwrap();
        let table = TableName::parse("hosts").unwrap();
        let mut writer = BatchedWriter::new(WriterConfig::new(dir.path()));
        writer.register_table(&table, columns()).unwrap();

        let mut bad = row("a", true, 1, 1.0, 1);
        bad[3] = Value::Float32(1.0);
        let err = writer.append_row(&table, &bad).unwrap_err();
        assert!(matches!(
            err,
            WriteError::TypeMismatch {
                expected: StorageType::Float64,
                found: StorageType::Float32,
                ..
            }
        ));

        let err = writer.append_row(&table, &bad[..2]).unwrap_err();
        assert!(matches!(err, WriteError::ColumnCount { expected: 5, found: 2, .. }));
        assert_eq!(writer.rows_pending(), 0);
    }

    #[test]
    fn out_of_range_timestamp_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let table = TableName::parse("hosts").unwrap();
        let mut writer = BatchedWriter::new(WriterConfig::new(dir.path()));
        writer.register_table(&table, columns()).unwrap();
        let bad = row("a", true, 1, 1.0, i64::MAX);
        assert!(matches!(
            writer.append_row(&table, &bad),
            Err(WriteError::TimestampOutOfRange { .. })
        ));
    }

    #[test]
    fn unknown_table_and_schema_change() {
        let dir = tempfile::tempdir().unwrap();
        let table = TableName::parse("hosts").unwrap();
        let mut writer = BatchedWriter::new(WriterConfig::new(dir.path()));
        assert!(matches!(
            writer.append_row(&table, &[]),
            Err(WriteError::UnknownTable(_))
        ));
        writer.register_table(&table, columns()).unwrap();
        writer.register_table(&table, columns()).unwrap();
        let err = writer
            .register_table(&table, vec![ColumnSpec::new("x", StorageType::Int32)])
            .unwrap_err();
        assert!(matches!(err, WriteError::SchemaChanged { .. }));
    }

    #[test]
    fn empty_tables_write_no_files() {
        let dir = tempfile::tempdir().unwrap();
        let table = TableName::parse("idle").unwrap();
        let mut writer = BatchedWriter::new(
            WriterConfig::new(dir.path()).with_compression(Compression::Uncompressed),
        );
        writer.register_table(&table, columns()).unwrap();
        assert!(writer.finish().unwrap().is_empty());
        assert!(!writer.table_path(&table).exists());
    }

    #[test]
    fn conversion_into_common_error() {
        let e: ti_common::Error = WriteError::UnknownTable("t".into()).into();
        assert_eq!(e.code(), 40);
        let e: ti_common::Error = WriteError::TimestampOutOfRange {
            table: "t".into(),
            column: "at".into(),
        }
        .into();
        assert_eq!(e.code(), 41);
    }
}
