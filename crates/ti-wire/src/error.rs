//! Error types for wire decoding.

use thiserror::Error;

/// Result type alias for wire operations.
pub type Result<T> = std::result::Result<T, WireError>;

/// Malformed-input errors raised by [`crate::WireDecoder`].
///
/// Offsets are relative to the buffer the failing decoder was opened over,
/// which for nested payloads is the payload itself.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WireError {
    /// Buffer exhausted in the middle of a value.
    #[error("unexpected end of buffer at offset {offset}")]
    UnexpectedEnd { offset: usize },

    /// Varint longer than 64 bits, or a field after the last legal one.
    #[error("value overflow at offset {offset}")]
    Overflow { offset: usize },

    /// Wire type outside 0-5, or not the one expected.
    #[error("bad wire type {found} at offset {offset}")]
    BadWireType { found: u64, offset: usize },

    /// Field tag not the one expected.
    #[error("bad tag {found} at offset {offset}")]
    BadTag { found: u64, offset: usize },
}

impl WireError {
    /// Byte offset where decoding failed.
    pub fn offset(&self) -> usize {
        match self {
            WireError::UnexpectedEnd { offset }
            | WireError::Overflow { offset }
            | WireError::BadWireType { offset, .. }
            | WireError::BadTag { offset, .. } => *offset,
        }
    }
}
