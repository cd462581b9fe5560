//! Row sinks: where assembled rows go.
//!
//! The ingester hands each complete row to a [`RowSink`] together with the
//! table layout it belongs to. Sinks may buffer; [`RowSink::finish`] makes
//! buffered rows durable.

use serde_json::{Map, Value as JsonValue};
use std::io::Write;
use std::path::PathBuf;
use ti_common::{Error, Record, Result, TableName, Value, RESERVED_TABLE_COLUMN};
use ti_telemetry::{BatchedWriter, WriterConfig};
use tracing::debug;

use crate::layout::TableLayout;

/// Key added to JSON rows naming the target table.
pub const TABLE_KEY: &str = RESERVED_TABLE_COLUMN;

/// Single-row writer for a dynamically named table.
///
/// No transaction semantics: a row accepted by `insert_row` stays accepted
/// even if a later row fails.
pub trait RowSink {
    fn insert_row(&mut self, layout: &TableLayout, row: &[Value]) -> Result<()>;

    /// Flush buffered rows.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

fn check_arity(layout: &TableLayout, row: &[Value]) -> Result<()> {
    if row.len() != layout.len() {
        return Err(Error::Sink(format!(
            "row for {} has {} values, expected {}",
            layout.table(),
            row.len(),
            layout.len()
        )));
    }
    Ok(())
}

/// A row as a JSON object keyed by column name, plus [`TABLE_KEY`].
///
/// Fails if a column is itself named [`TABLE_KEY`].
pub fn row_object(layout: &TableLayout, row: &[Value]) -> Result<Map<String, JsonValue>> {
    let mut obj = Map::new();
    obj.insert(TABLE_KEY.to_string(), JsonValue::from(layout.table().as_str()));
    for (col, value) in layout.columns().iter().zip(row) {
        if col.name == TABLE_KEY {
            return Err(Error::Sink(format!(
                "column '{}' of {} collides with the table key",
                col.name,
                layout.table()
            )));
        }
        obj.insert(col.name.clone(), value.to_json());
    }
    Ok(obj)
}

// ── Memory ──────────────────────────────────────────────────────────────

/// Collects rows in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    rows: Vec<(TableName, Record)>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> &[(TableName, Record)] {
        &self.rows
    }

    /// Rows delivered to one table, in arrival order.
    pub fn rows_for<'a>(&'a self, table: &'a TableName) -> impl Iterator<Item = &'a Record> + 'a {
        self.rows
            .iter()
            .filter(move |(t, _)| t == table)
            .map(|(_, row)| row)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn into_rows(self) -> Vec<(TableName, Record)> {
        self.rows
    }
}

impl RowSink for MemorySink {
    fn insert_row(&mut self, layout: &TableLayout, row: &[Value]) -> Result<()> {
        check_arity(layout, row)?;
        self.rows.push((layout.table().clone(), row.to_vec()));
        Ok(())
    }
}

// ── JSON ────────────────────────────────────────────────────────────────

/// Writes one JSON object per line.
pub struct JsonLinesSink<W: Write> {
    out: W,
    rows: u64,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(out: W) -> Self {
        JsonLinesSink { out, rows: 0 }
    }

    pub fn rows(&self) -> u64 {
        self.rows
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> RowSink for JsonLinesSink<W> {
    fn insert_row(&mut self, layout: &TableLayout, row: &[Value]) -> Result<()> {
        check_arity(layout, row)?;
        serde_json::to_writer(&mut self.out, &row_object(layout, row)?)?;
        self.out.write_all(b"\n")?;
        self.rows += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}

/// Buffers rows and writes them as one pretty-printed JSON array on finish.
pub struct JsonArraySink<W: Write> {
    out: W,
    rows: Vec<JsonValue>,
}

impl<W: Write> JsonArraySink<W> {
    pub fn new(out: W) -> Self {
        JsonArraySink {
            out,
            rows: Vec::new(),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> RowSink for JsonArraySink<W> {
    fn insert_row(&mut self, layout: &TableLayout, row: &[Value]) -> Result<()> {
        check_arity(layout, row)?;
        self.rows.push(JsonValue::Object(row_object(layout, row)?));
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        let rows = std::mem::take(&mut self.rows);
        serde_json::to_writer_pretty(&mut self.out, &rows)?;
        self.out.write_all(b"\n")?;
        self.out.flush()?;
        Ok(())
    }
}

// ── Parquet ─────────────────────────────────────────────────────────────

/// Writes rows to Parquet through a [`BatchedWriter`].
pub struct ParquetSink {
    writer: BatchedWriter,
    files: Vec<PathBuf>,
}

impl ParquetSink {
    pub fn new(config: WriterConfig) -> Self {
        ParquetSink {
            writer: BatchedWriter::new(config),
            files: Vec::new(),
        }
    }

    /// Files closed by [`RowSink::finish`].
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn writer(&self) -> &BatchedWriter {
        &self.writer
    }
}

impl RowSink for ParquetSink {
    fn insert_row(&mut self, layout: &TableLayout, row: &[Value]) -> Result<()> {
        self.writer.register_table(layout.table(), layout.column_specs())?;
        self.writer.append_row(layout.table(), row)?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        let files = self.writer.finish()?;
        debug!(files = files.len(), "parquet sink finished");
        self.files.extend(files);
        Ok(())
    }
}

// ── Counting ────────────────────────────────────────────────────────────

/// Wraps a sink and counts the rows it accepted.
pub struct CountingSink<'a> {
    inner: &'a mut dyn RowSink,
    rows: u64,
}

impl<'a> CountingSink<'a> {
    pub fn new(inner: &'a mut dyn RowSink) -> Self {
        CountingSink { inner, rows: 0 }
    }

    /// Rows the inner sink accepted.
    pub fn rows(&self) -> u64 {
        self.rows
    }
}

impl RowSink for CountingSink<'_> {
    fn insert_row(&mut self, layout: &TableLayout, row: &[Value]) -> Result<()> {
        self.inner.insert_row(layout, row)?;
        self.rows += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.inner.finish()
    }
}
