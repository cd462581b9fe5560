//! Encoder for the wire format.
//!
//! Appends to an owned buffer and never fails. The `field_*` helpers follow
//! the default-omission rule: a field whose value is its type's zero value
//! is not written at all.

use crate::timestamp::Timestamp;
use crate::wire_type::{FieldKey, WireType};

/// Zig-zag map a signed 32-bit value so small magnitudes stay short.
pub fn zigzag_encode32(n: i32) -> u32 {
    ((n << 1) ^ (n >> 31)) as u32
}

/// Zig-zag map a signed 64-bit value so small magnitudes stay short.
pub fn zigzag_encode64(n: i64) -> u64 {
    ((n << 1) ^ (n >> 63)) as u64
}

/// Growable output buffer for wire-format data.
#[derive(Debug, Clone, Default)]
pub struct WireEncoder {
    buf: Vec<u8>,
}

impl WireEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        WireEncoder {
            buf: Vec::with_capacity(capacity),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn encode_varint(&mut self, mut value: u64) {
        while value >= 0x80 {
            self.buf.push((value as u8 & 0x7f) | 0x80);
            value >>= 7;
        }
        self.buf.push(value as u8);
    }

    pub fn encode_key(&mut self, wire_type: WireType, tag: u64) {
        self.encode_varint(FieldKey::new(wire_type, tag).to_raw());
    }

    pub fn encode_zigzag32(&mut self, n: i32) {
        self.encode_varint(u64::from(zigzag_encode32(n)));
    }

    pub fn encode_zigzag64(&mut self, n: i64) {
        self.encode_varint(zigzag_encode64(n));
    }

    pub fn encode_fixed32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn encode_fixed64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn encode_float32(&mut self, v: f32) {
        self.encode_fixed32(v.to_bits());
    }

    pub fn encode_float64(&mut self, v: f64) {
        self.encode_fixed64(v.to_bits());
    }

    /// Length prefix followed by the raw bytes.
    pub fn encode_bytes(&mut self, bytes: &[u8]) {
        self.encode_varint(bytes.len() as u64);
        self.buf.extend_from_slice(bytes);
    }

    pub fn encode_str(&mut self, s: &str) {
        self.encode_bytes(s.as_bytes());
    }

    /// Length-delimited timestamp payload; zero seconds and zero nanos are
    /// omitted, so the epoch encodes as an empty payload.
    pub fn encode_timestamp(&mut self, ts: Timestamp) {
        let mut inner = WireEncoder::with_capacity(16);
        if ts.seconds != 0 {
            inner.encode_key(WireType::Varint, 1);
            inner.encode_varint(ts.seconds as u64);
        }
        if ts.nanos != 0 {
            inner.encode_key(WireType::Varint, 2);
            inner.encode_varint(ts.nanos as i64 as u64);
        }
        self.encode_bytes(&inner.buf);
    }

    /// Write a length-delimited field whose payload is built by `f`.
    pub fn encode_nested(&mut self, tag: u64, f: impl FnOnce(&mut WireEncoder)) {
        let mut inner = WireEncoder::new();
        f(&mut inner);
        self.encode_key(WireType::LengthDelimited, tag);
        self.encode_bytes(&inner.buf);
    }

    // ── Field helpers (default omission) ───────────────────────────────

    /// Varint field, omitted when zero. Signed values are passed already
    /// sign-extended to 64 bits.
    pub fn field_varint(&mut self, tag: u64, value: u64) {
        if value != 0 {
            self.encode_key(WireType::Varint, tag);
            self.encode_varint(value);
        }
    }

    pub fn field_zigzag32(&mut self, tag: u64, value: i32) {
        if value != 0 {
            self.encode_key(WireType::Varint, tag);
            self.encode_zigzag32(value);
        }
    }

    pub fn field_zigzag64(&mut self, tag: u64, value: i64) {
        if value != 0 {
            self.encode_key(WireType::Varint, tag);
            self.encode_zigzag64(value);
        }
    }

    pub fn field_fixed32(&mut self, tag: u64, value: u32) {
        if value != 0 {
            self.encode_key(WireType::Fixed32, tag);
            self.encode_fixed32(value);
        }
    }

    pub fn field_fixed64(&mut self, tag: u64, value: u64) {
        if value != 0 {
            self.encode_key(WireType::Fixed64, tag);
            self.encode_fixed64(value);
        }
    }

    /// Float field, omitted for +0.0 only (negative zero has a distinct bit
    /// pattern and is written).
    pub fn field_float32(&mut self, tag: u64, value: f32) {
        self.field_fixed32(tag, value.to_bits());
    }

    pub fn field_float64(&mut self, tag: u64, value: f64) {
        self.field_fixed64(tag, value.to_bits());
    }

    pub fn field_str(&mut self, tag: u64, value: &str) {
        if !value.is_empty() {
            self.encode_key(WireType::LengthDelimited, tag);
            self.encode_str(value);
        }
    }

    /// Timestamp field. `None` writes nothing; the epoch is omitted as well
    /// since it is the zero value.
    pub fn field_timestamp(&mut self, tag: u64, value: Option<Timestamp>) {
        if let Some(ts) = value.filter(|ts| !ts.is_epoch()) {
            self.encode_key(WireType::LengthDelimited, tag);
            self.encode_timestamp(ts);
        }
    }
}
