//! Wire types and field keys.

use std::fmt;

/// Physical encoding of a field, carried in the low 3 bits of its key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum WireType {
    Varint = 0,
    Fixed64 = 1,
    LengthDelimited = 2,
    StartGroup = 3,
    EndGroup = 4,
    Fixed32 = 5,
}

impl WireType {
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            WireType::Varint => "varint",
            WireType::Fixed64 => "fixed64",
            WireType::LengthDelimited => "length_delimited",
            WireType::StartGroup => "start_group",
            WireType::EndGroup => "end_group",
            WireType::Fixed32 => "fixed32",
        }
    }
}

impl TryFrom<u64> for WireType {
    type Error = u64;

    fn try_from(raw: u64) -> Result<Self, Self::Error> {
        match raw {
            0 => Ok(WireType::Varint),
            1 => Ok(WireType::Fixed64),
            2 => Ok(WireType::LengthDelimited),
            3 => Ok(WireType::StartGroup),
            4 => Ok(WireType::EndGroup),
            5 => Ok(WireType::Fixed32),
            other => Err(other),
        }
    }
}

impl fmt::Display for WireType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A decoded field key: `(tag << 3) | wire_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldKey {
    pub wire_type: WireType,
    pub tag: u64,
}

impl FieldKey {
    pub fn new(wire_type: WireType, tag: u64) -> Self {
        FieldKey { wire_type, tag }
    }

    /// Split a raw key varint into wire type and tag.
    pub fn from_raw(raw: u64) -> Result<Self, u64> {
        let wire_type = WireType::try_from(raw & 0x7)?;
        Ok(FieldKey {
            wire_type,
            tag: raw >> 3,
        })
    }

    /// Raw key value as written on the wire (before varint encoding).
    pub fn to_raw(self) -> u64 {
        (self.tag << 3) | u64::from(self.wire_type.as_u8())
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.wire_type, self.tag)
    }
}
