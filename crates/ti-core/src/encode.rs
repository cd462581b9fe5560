//! Encoding rows into ingestion buffers.
//!
//! The inverse of the ingester, used to build fixtures: rows given as JSON
//! arrays in column order become a top-level buffer with one record per row.
//! Default-valued fields are omitted exactly as a producer would omit them.

use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use ti_common::{Error, LogicalType, Record, Result, Value};
use ti_wire::{Timestamp, WireEncoder, WireType, RECORD_TAG};

use crate::layout::{ResolvedColumn, TableLayout};

fn mismatch(column: &ResolvedColumn, reason: impl Into<String>) -> Error {
    Error::ValueMismatch {
        column: column.name.clone(),
        reason: reason.into(),
    }
}

/// Convert a JSON value to the column's scalar. `null` means the default.
///
/// Timestamps accept an RFC 3339 string or integer seconds since the epoch.
pub fn value_from_json(column: &ResolvedColumn, json: &JsonValue) -> Result<Value> {
    if json.is_null() {
        return Ok(column.default.clone());
    }
    let expected = || mismatch(column, format!("expected {}, got {}", column.logical, json));

    let value = match column.logical {
        LogicalType::Bool => Value::Bool(json.as_bool().ok_or_else(expected)?),
        LogicalType::Int32 | LogicalType::Sint32 | LogicalType::Sfixed32 => {
            let n = json.as_i64().ok_or_else(expected)?;
            Value::Int32(i32::try_from(n).map_err(|_| mismatch(column, format!("{n} out of range for int32")))?)
        }
        LogicalType::Int64 | LogicalType::Sint64 | LogicalType::Sfixed64 => {
            Value::Int64(json.as_i64().ok_or_else(expected)?)
        }
        LogicalType::Uint32 | LogicalType::Fixed32 => {
            let n = json.as_u64().ok_or_else(expected)?;
            Value::Uint32(u32::try_from(n).map_err(|_| mismatch(column, format!("{n} out of range for uint32")))?)
        }
        LogicalType::Uint64 | LogicalType::Fixed64 => Value::Uint64(json.as_u64().ok_or_else(expected)?),
        LogicalType::Float => Value::Float32(json.as_f64().ok_or_else(expected)? as f32),
        LogicalType::Double => Value::Float64(json.as_f64().ok_or_else(expected)?),
        LogicalType::String => Value::Text(json.as_str().ok_or_else(expected)?.to_string()),
        LogicalType::Timestamp => Value::Timestamp(timestamp_from_json(column, json)?),
    };
    Ok(value)
}

fn timestamp_from_json(column: &ResolvedColumn, json: &JsonValue) -> Result<Timestamp> {
    if let Some(secs) = json.as_i64() {
        return Ok(Timestamp::new(secs, 0));
    }
    let text = json
        .as_str()
        .ok_or_else(|| mismatch(column, format!("expected RFC 3339 string or seconds, got {json}")))?;
    let dt = DateTime::parse_from_rfc3339(text)
        .map_err(|e| mismatch(column, format!("invalid timestamp {text:?}: {e}")))?;
    Ok(Timestamp::from_datetime(dt.with_timezone(&Utc)))
}

/// Parse one JSON array into a row for `layout`.
pub fn row_from_json(layout: &TableLayout, json: &JsonValue) -> Result<Record> {
    let items = json.as_array().ok_or_else(|| {
        Error::SchemaValidation(format!("row must be a JSON array, got {json}"))
    })?;
    if items.len() != layout.len() {
        return Err(Error::SchemaValidation(format!(
            "row has {} values, table {} has {} columns",
            items.len(),
            layout.table(),
            layout.len()
        )));
    }
    layout
        .columns()
        .iter()
        .zip(items)
        .map(|(col, item)| value_from_json(col, item))
        .collect()
}

/// Write one field with default omission.
fn encode_field(enc: &mut WireEncoder, tag: u64, column: &ResolvedColumn, value: &Value) -> Result<()> {
    match (column.logical, value) {
        (LogicalType::Bool, Value::Bool(b)) => enc.field_varint(tag, u64::from(*b)),
        (LogicalType::Int32, Value::Int32(v)) => enc.field_varint(tag, i64::from(*v) as u64),
        (LogicalType::Int64, Value::Int64(v)) => enc.field_varint(tag, *v as u64),
        (LogicalType::Uint32, Value::Uint32(v)) => enc.field_varint(tag, u64::from(*v)),
        (LogicalType::Uint64, Value::Uint64(v)) => enc.field_varint(tag, *v),
        (LogicalType::Sint32, Value::Int32(v)) => enc.field_zigzag32(tag, *v),
        (LogicalType::Sint64, Value::Int64(v)) => enc.field_zigzag64(tag, *v),
        (LogicalType::Fixed32, Value::Uint32(v)) => enc.field_fixed32(tag, *v),
        (LogicalType::Fixed64, Value::Uint64(v)) => enc.field_fixed64(tag, *v),
        (LogicalType::Sfixed32, Value::Int32(v)) => enc.field_fixed32(tag, *v as u32),
        (LogicalType::Sfixed64, Value::Int64(v)) => enc.field_fixed64(tag, *v as u64),
        (LogicalType::Float, Value::Float32(v)) => enc.field_float32(tag, *v),
        (LogicalType::Double, Value::Float64(v)) => enc.field_float64(tag, *v),
        (LogicalType::String, Value::Text(s)) => enc.field_str(tag, s),
        (LogicalType::Timestamp, Value::Timestamp(ts)) => enc.field_timestamp(tag, Some(*ts)),
        (logical, other) => {
            return Err(mismatch(column, format!("{logical} column cannot hold {other:?}")));
        }
    }
    Ok(())
}

/// Encode one row as a record payload (without the outer wrapper).
pub fn encode_record(layout: &TableLayout, row: &[Value]) -> Result<Vec<u8>> {
    if row.len() != layout.len() {
        return Err(Error::SchemaValidation(format!(
            "row has {} values, table {} has {} columns",
            row.len(),
            layout.table(),
            layout.len()
        )));
    }
    let mut enc = WireEncoder::new();
    for (i, (column, value)) in layout.columns().iter().zip(row).enumerate() {
        encode_field(&mut enc, i as u64 + 1, column, value)?;
    }
    Ok(enc.into_inner())
}

/// Encode rows into a top-level ingestion buffer.
pub fn encode_records(layout: &TableLayout, rows: &[Record]) -> Result<Vec<u8>> {
    let mut enc = WireEncoder::new();
    for row in rows {
        let payload = encode_record(layout, row)?;
        enc.encode_key(WireType::LengthDelimited, RECORD_TAG);
        enc.encode_bytes(&payload);
    }
    Ok(enc.into_inner())
}
