//! Property-based tests for the record ingester: rows written with default
//! omission decode back to the same complete rows, whatever subset of
//! fields ends up on the wire, and no input makes ingestion panic.

use proptest::prelude::*;
use std::sync::Arc;
use ti_common::{ColumnSchema, Error, Record, StreamId, Value};
use ti_core::{
    decode_record, encode_record, encode_records, InMemoryCatalog, MemorySink, RecordIngester,
    TypeRegistry,
};
use ti_wire::{Timestamp, WireEncoder, WireType, RECORD_TAG};

const ALL_TYPES: [&str; 15] = [
    "bool", "int32", "int64", "uint32", "uint64", "sint32", "sint64", "fixed32", "fixed64",
    "sfixed32", "sfixed64", "float", "double", "string", "timestamp",
];

fn mixed_schema() -> ColumnSchema {
    ColumnSchema::from_pairs(ALL_TYPES.iter().map(|t| (*t, *t)))
}

fn mixed_row() -> impl Strategy<Value = Record> {
    let ints = (
        any::<bool>(),
        any::<i32>(),
        any::<i64>(),
        any::<u32>(),
        any::<u64>(),
        any::<i32>(),
        any::<i64>(),
        any::<u32>(),
    );
    let rest = (
        any::<u64>(),
        any::<i32>(),
        any::<i64>(),
        -1e6f32..1e6f32,
        -1e12f64..1e12f64,
        "\\PC{0,12}",
        (any::<i64>(), 0..1_000_000_000i32),
    );
    (ints, rest).prop_map(|((b, i32a, i64a, u32a, u64a, s32, s64, f32a), (f64a, sf32, sf64, fl, db, s, (secs, nanos)))| {
        vec![
            Value::Bool(b),
            Value::Int32(i32a),
            Value::Int64(i64a),
            Value::Uint32(u32a),
            Value::Uint64(u64a),
            Value::Int32(s32),
            Value::Int64(s64),
            Value::Uint32(f32a),
            Value::Uint64(f64a),
            Value::Int32(sf32),
            Value::Int64(sf64),
            Value::Float32(fl),
            Value::Float64(db),
            Value::Text(s),
            Value::Timestamp(Timestamp::new(secs, nanos)),
        ]
    })
}

fn ingester() -> RecordIngester {
    RecordIngester::new(Arc::new(TypeRegistry::standard()))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn mixed_rows_roundtrip(rows in prop::collection::vec(mixed_row(), 0..8)) {
        let catalog = InMemoryCatalog::new().with_stream("mixed", mixed_schema());
        let stream = StreamId::new("mixed");
        let ingester = ingester();
        let layout = ingester.layout(&catalog, &stream).unwrap();

        let buf = encode_records(&layout, &rows).unwrap();
        let mut sink = MemorySink::new();
        let summary = ingester.ingest(&catalog, &mut sink, &stream, &buf).unwrap();

        prop_assert_eq!(summary.records as usize, rows.len());
        let decoded: Vec<Record> = sink.into_rows().into_iter().map(|(_, row)| row).collect();
        prop_assert_eq!(decoded, rows);
    }

    /// Each column is either present with a non-zero value or omitted; the
    /// omitted ones must come back as defaults in the right positions.
    #[test]
    fn gap_fill_over_random_tag_subsets(values in prop::collection::vec(prop::option::of(1u64..), 1..40)) {
        let schema = ColumnSchema::from_pairs(
            (0..values.len()).map(|_| ("c", "uint64")).collect::<Vec<_>>(),
        );
        let catalog = InMemoryCatalog::new().with_stream("wide", schema);
        let stream = StreamId::new("wide");
        let layout = ingester().layout(&catalog, &stream).unwrap();

        let mut rec = WireEncoder::new();
        for (i, v) in values.iter().enumerate() {
            if let Some(v) = v {
                rec.field_varint(i as u64 + 1, *v);
            }
        }
        let row = decode_record(&layout, rec.as_bytes()).unwrap();

        let expected: Record = values.iter().map(|v| Value::Uint64(v.unwrap_or(0))).collect();
        prop_assert_eq!(row, expected);
    }

    #[test]
    fn single_record_encoding_is_stable(row in mixed_row()) {
        let catalog = InMemoryCatalog::new().with_stream("mixed", mixed_schema());
        let layout = ingester().layout(&catalog, &StreamId::new("mixed")).unwrap();
        let bytes = encode_record(&layout, &row).unwrap();
        let decoded = decode_record(&layout, &bytes).unwrap();
        prop_assert_eq!(encode_record(&layout, &decoded).unwrap(), bytes);
    }

    /// Rows before the first malformed record reach the sink; nothing after.
    #[test]
    fn failure_keeps_only_earlier_rows(good in 0usize..6, trailing in 0usize..4) {
        let catalog = InMemoryCatalog::new()
            .with_stream("s", ColumnSchema::from_pairs([("n", "uint32")]));
        let stream = StreamId::new("s");

        let mut enc = WireEncoder::new();
        for i in 0..good + 1 + trailing {
            let mut rec = WireEncoder::new();
            // Tag 2 is beyond the single column.
            let tag = if i == good { 2 } else { 1 };
            rec.field_varint(tag, i as u64 + 1);
            enc.encode_key(WireType::LengthDelimited, RECORD_TAG);
            enc.encode_bytes(rec.as_bytes());
        }

        let mut sink = MemorySink::new();
        let err = ingester().ingest(&catalog, &mut sink, &stream, enc.as_bytes()).unwrap_err();
        prop_assert!(
            matches!(err, Error::InvalidField { tag: 2, .. }),
            "unexpected error: {}",
            err
        );
        prop_assert_eq!(sink.len(), good);
    }

    #[test]
    fn arbitrary_buffers_never_panic(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
        let catalog = InMemoryCatalog::new().with_stream("mixed", mixed_schema());
        let stream = StreamId::new("mixed");
        let mut sink = MemorySink::new();
        let _ = ingester().ingest(&catalog, &mut sink, &stream, &bytes);
    }

    #[test]
    fn arbitrary_record_payloads_never_panic(bytes in prop::collection::vec(any::<u8>(), 0..128)) {
        let catalog = InMemoryCatalog::new().with_stream("mixed", mixed_schema());
        let layout = ingester().layout(&catalog, &StreamId::new("mixed")).unwrap();
        if let Ok(row) = decode_record(&layout, &bytes) {
            prop_assert_eq!(row.len(), layout.len());
        }
    }
}
