//! Cursor-based decoder over an immutable byte buffer.
//!
//! Every operation either advances the cursor by exactly the bytes it
//! consumed or leaves it where it was and returns a [`WireError`]. No input,
//! however malformed, makes the decoder panic.

use std::borrow::Cow;

use crate::error::{Result, WireError};
use crate::timestamp::Timestamp;
use crate::wire_type::{FieldKey, WireType};

/// Maximum number of 7-bit groups in a varint (64-bit ceiling).
pub const MAX_VARINT_LEN: usize = 10;

const TIMESTAMP_SECONDS_TAG: u64 = 1;
const TIMESTAMP_NANOS_TAG: u64 = 2;

/// Read cursor over a wire-format buffer.
///
/// Not shareable across threads while decoding; each ingestion call owns
/// its own cursor.
#[derive(Debug, Clone)]
pub struct WireDecoder<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> WireDecoder<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        WireDecoder { buf, pos: 0 }
    }

    /// Current read offset.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left to read.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// True once the whole buffer has been consumed.
    pub fn is_complete(&self) -> bool {
        self.pos >= self.buf.len()
    }

    /// Decode a base-128 little-endian varint.
    pub fn decode_varint(&mut self) -> Result<u64> {
        let mut value: u64 = 0;
        for i in 0..MAX_VARINT_LEN {
            let Some(&byte) = self.buf.get(self.pos + i) else {
                return Err(WireError::UnexpectedEnd {
                    offset: self.buf.len(),
                });
            };
            value |= u64::from(byte & 0x7f) << (7 * i);
            if byte & 0x80 == 0 {
                self.pos += i + 1;
                return Ok(value);
            }
        }
        Err(WireError::Overflow { offset: self.pos })
    }

    /// Decode a field key and split it into wire type and tag.
    pub fn decode_key(&mut self) -> Result<FieldKey> {
        self.atomically(|d| {
            let start = d.pos;
            let raw = d.decode_varint()?;
            FieldKey::from_raw(raw).map_err(|found| WireError::BadWireType {
                found,
                offset: start,
            })
        })
    }

    /// Decode a key and require it to be exactly `(wire_type, tag)`.
    pub fn decode_check_key(&mut self, wire_type: WireType, tag: u64) -> Result<()> {
        self.atomically(|d| {
            let start = d.pos;
            let key = d.decode_key()?;
            if key.wire_type != wire_type {
                return Err(WireError::BadWireType {
                    found: u64::from(key.wire_type.as_u8()),
                    offset: start,
                });
            }
            if key.tag != tag {
                return Err(WireError::BadTag {
                    found: key.tag,
                    offset: start,
                });
            }
            Ok(())
        })
    }

    pub fn decode_zigzag32(&mut self) -> Result<i32> {
        let v = self.decode_varint()? as u32;
        Ok(((v >> 1) as i32) ^ -((v & 1) as i32))
    }

    pub fn decode_zigzag64(&mut self) -> Result<i64> {
        let v = self.decode_varint()?;
        Ok(((v >> 1) as i64) ^ -((v & 1) as i64))
    }

    pub fn decode_fixed32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.take_array::<4>()?))
    }

    pub fn decode_fixed64(&mut self) -> Result<u64> {
        Ok(u64::from_le_bytes(self.take_array::<8>()?))
    }

    pub fn decode_float32(&mut self) -> Result<f32> {
        Ok(f32::from_bits(self.decode_fixed32()?))
    }

    pub fn decode_float64(&mut self) -> Result<f64> {
        Ok(f64::from_bits(self.decode_fixed64()?))
    }

    /// Decode a length-delimited payload, borrowing it from the buffer.
    pub fn decode_bytes(&mut self) -> Result<&'a [u8]> {
        self.atomically(|d| {
            let len = d.decode_varint()?;
            let len = usize::try_from(len).map_err(|_| WireError::UnexpectedEnd {
                offset: d.buf.len(),
            })?;
            d.take(len)
        })
    }

    /// Decode a length-delimited payload. With `copy` the bytes are
    /// duplicated into an owned buffer; without it they alias the source.
    /// Content is identical either way.
    pub fn decode_raw_bytes(&mut self, copy: bool) -> Result<Cow<'a, [u8]>> {
        let bytes = self.decode_bytes()?;
        Ok(if copy {
            Cow::Owned(bytes.to_vec())
        } else {
            Cow::Borrowed(bytes)
        })
    }

    /// Decode a length-delimited payload as text. Invalid UTF-8 sequences
    /// are replaced rather than rejected.
    pub fn decode_string_bytes(&mut self) -> Result<Cow<'a, str>> {
        let bytes = self.decode_bytes()?;
        Ok(String::from_utf8_lossy(bytes))
    }

    /// Decode a nested timestamp message.
    ///
    /// The encoder omits zero-valued fields, so the payload holds nothing
    /// (epoch), seconds only, nanos only, or seconds followed by nanos.
    /// Nanos is always the last field; anything after it is an `Overflow`.
    pub fn decode_timestamp(&mut self) -> Result<Timestamp> {
        self.atomically(|d| {
            let payload = d.decode_bytes()?;
            decode_timestamp_payload(payload)
        })
    }

    /// Advance over `len` bytes, returning them.
    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.buf.len())
            .ok_or(WireError::UnexpectedEnd {
                offset: self.buf.len(),
            })?;
        let out = &self.buf[self.pos..end];
        self.pos = end;
        Ok(out)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let bytes = self.take(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    /// Run a multi-step decode, restoring the cursor if any step fails.
    fn atomically<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let start = self.pos;
        let out = f(self);
        if out.is_err() {
            self.pos = start;
        }
        out
    }
}

fn decode_timestamp_payload(payload: &[u8]) -> Result<Timestamp> {
    let mut sub = WireDecoder::new(payload);
    if sub.is_complete() {
        return Ok(Timestamp::EPOCH);
    }

    let start = sub.position();
    let key = sub.decode_key()?;
    if key.wire_type != WireType::Varint {
        return Err(WireError::BadWireType {
            found: u64::from(key.wire_type.as_u8()),
            offset: start,
        });
    }

    match key.tag {
        TIMESTAMP_SECONDS_TAG => {
            let seconds = sub.decode_varint()? as i64;
            if sub.is_complete() {
                return Ok(Timestamp::new(seconds, 0));
            }
            sub.decode_check_key(WireType::Varint, TIMESTAMP_NANOS_TAG)?;
            let nanos = sub.decode_varint()? as i32;
            finish_timestamp(&sub, Timestamp::new(seconds, nanos))
        }
        TIMESTAMP_NANOS_TAG => {
            // seconds was zero and therefore omitted
            let nanos = sub.decode_varint()? as i32;
            finish_timestamp(&sub, Timestamp::new(0, nanos))
        }
        found => Err(WireError::BadTag {
            found,
            offset: start,
        }),
    }
}

fn finish_timestamp(sub: &WireDecoder<'_>, ts: Timestamp) -> Result<Timestamp> {
    if sub.is_complete() {
        Ok(ts)
    } else {
        Err(WireError::Overflow {
            offset: sub.position(),
        })
    }
}
