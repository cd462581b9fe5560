//! Record ingestion.
//!
//! An ingestion buffer is a sequence of top-level records, each wrapped as a
//! length-delimited field with tag [`RECORD_TAG`]. Inside a record, field
//! tags are 1-based column positions and appear in increasing order. Fields
//! whose value equals the type's zero value are omitted by the encoder, so a
//! gap between consecutive tags (or after the last one) means every skipped
//! column holds its default.
//!
//! Rows are delivered to the sink one at a time as they are assembled. If a
//! later record fails, rows already delivered stay with the sink.

use serde::Serialize;
use std::sync::Arc;
use ti_common::{Error, LogicalType, Record, Result, StreamId, TableName, Value};
use ti_wire::{WireDecoder, WireError, WireType, RECORD_TAG};
use tracing::{debug, info, warn};

use crate::catalog::ColumnCatalog;
use crate::layout::TableLayout;
use crate::registry::TypeRegistry;
use crate::sink::RowSink;

/// Outcome of one successful ingestion call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestSummary {
    pub stream: StreamId,
    pub table: TableName,
    /// Rows delivered to the sink.
    pub records: u64,
    /// Fingerprint of the column schema used.
    pub fingerprint: String,
}

/// Decodes ingestion buffers into rows, directed by a stream's columns.
#[derive(Debug, Clone)]
pub struct RecordIngester {
    registry: Arc<TypeRegistry>,
}

impl RecordIngester {
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        RecordIngester { registry }
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Fetch a stream's schema and resolve it against the registry.
    pub fn layout(&self, catalog: &dyn ColumnCatalog, stream: &StreamId) -> Result<TableLayout> {
        let schema = catalog.get_schema(stream)?;
        let table = catalog.table_name(stream)?;
        TableLayout::resolve(stream.clone(), table, &schema, &self.registry)
    }

    /// Decode every record in `buf` and hand each row to `sink`.
    ///
    /// The schema is resolved before the first record, so an unknown type
    /// name fails without touching the sink. The first malformed record
    /// aborts the call; records after it are not decoded.
    pub fn ingest(
        &self,
        catalog: &dyn ColumnCatalog,
        sink: &mut dyn RowSink,
        stream: &StreamId,
        buf: &[u8],
    ) -> Result<IngestSummary> {
        let layout = self.layout(catalog, stream)?;
        debug!(
            stream = %stream,
            table = %layout.table(),
            columns = layout.len(),
            fingerprint = layout.fingerprint(),
            bytes = buf.len(),
            "schema resolved"
        );

        let mut outer = WireDecoder::new(buf);
        let mut records: u64 = 0;
        while !outer.is_complete() {
            if let Err(e) = ingest_next(&layout, &mut outer, sink) {
                warn!(
                    stream = %stream,
                    table = %layout.table(),
                    record = records,
                    rows = records,
                    error = %e,
                    "ingestion aborted"
                );
                return Err(e);
            }
            debug!(stream = %stream, record = records, "record ingested");
            records += 1;
        }

        info!(
            stream = %stream,
            table = %layout.table(),
            rows = records,
            fingerprint = layout.fingerprint(),
            "ingestion complete"
        );
        Ok(IngestSummary {
            stream: stream.clone(),
            table: layout.table().clone(),
            records,
            fingerprint: layout.fingerprint().to_string(),
        })
    }
}

fn ingest_next(layout: &TableLayout, outer: &mut WireDecoder<'_>, sink: &mut dyn RowSink) -> Result<()> {
    outer.decode_check_key(WireType::LengthDelimited, RECORD_TAG)?;
    let payload = outer.decode_bytes()?;
    let row = decode_record(layout, payload)?;
    sink.insert_row(layout, &row)
}

/// Decode one record payload into a complete row.
///
/// Tags must be strictly increasing and within `1..=layout.len()`, and each
/// field must use its column's wire type; anything else is `InvalidField`.
pub fn decode_record(layout: &TableLayout, bytes: &[u8]) -> Result<Record> {
    let mut dec = WireDecoder::new(bytes);
    let mut row: Record = Vec::with_capacity(layout.len());
    let mut last_tag: u64 = 0;

    while !dec.is_complete() {
        let key = dec.decode_key()?;
        let tag = key.tag;

        let Some(column) = layout.column_for_tag(tag) else {
            let reason = if tag == 0 {
                "tag 0 is reserved".to_string()
            } else {
                format!("tag exceeds column count {}", layout.len())
            };
            return Err(Error::invalid_field(tag, reason));
        };
        if key.wire_type != column.wire {
            return Err(Error::invalid_field(
                tag,
                format!(
                    "column {} expects {} wire type, found {}",
                    column.name, column.wire, key.wire_type
                ),
            ));
        }
        if tag <= last_tag {
            return Err(Error::invalid_field(
                tag,
                format!("tag follows tag {last_tag}; tags must increase"),
            ));
        }

        // Columns between the previous tag and this one were omitted.
        let index = row.len() + (tag - last_tag - 1) as usize;
        fill_defaults(layout, &mut row, index);

        row.push(decode_value(&mut dec, column.logical)?);
        last_tag = tag;
    }

    fill_defaults(layout, &mut row, layout.len());
    Ok(row)
}

/// Push defaults until `row` has `upto` values.
fn fill_defaults(layout: &TableLayout, row: &mut Record, upto: usize) {
    let start = row.len();
    row.extend(layout.columns()[start..upto].iter().map(|c| c.default.clone()));
}

/// Decode one field value with the operation matching its logical type.
fn decode_value(dec: &mut WireDecoder<'_>, logical: LogicalType) -> std::result::Result<Value, WireError> {
    let value = match logical {
        LogicalType::Bool => Value::Bool(dec.decode_varint()? != 0),
        // Negative int32 values are sign-extended to 64 bits on the wire.
        LogicalType::Int32 => Value::Int32(dec.decode_varint()? as i32),
        LogicalType::Int64 => Value::Int64(dec.decode_varint()? as i64),
        LogicalType::Uint32 => Value::Uint32(dec.decode_varint()? as u32),
        LogicalType::Uint64 => Value::Uint64(dec.decode_varint()?),
        LogicalType::Sint32 => Value::Int32(dec.decode_zigzag32()?),
        LogicalType::Sint64 => Value::Int64(dec.decode_zigzag64()?),
        LogicalType::Fixed32 => Value::Uint32(dec.decode_fixed32()?),
        LogicalType::Fixed64 => Value::Uint64(dec.decode_fixed64()?),
        LogicalType::Sfixed32 => Value::Int32(dec.decode_fixed32()? as i32),
        LogicalType::Sfixed64 => Value::Int64(dec.decode_fixed64()? as i64),
        LogicalType::Float => Value::Float32(dec.decode_float32()?),
        LogicalType::Double => Value::Float64(dec.decode_float64()?),
        LogicalType::String => Value::Text(dec.decode_string_bytes()?.into_owned()),
        LogicalType::Timestamp => Value::Timestamp(dec.decode_timestamp()?),
    };
    Ok(value)
}
