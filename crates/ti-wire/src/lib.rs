//! Telemetry ingest wire format.
//!
//! This crate provides:
//! - A cursor-based decoder over an immutable byte buffer
//! - The matching encoder, used for fixtures and the `encode` command
//! - The composite timestamp encoding with default-value omission
//!
//! Nothing here knows about column schemas; callers drive the decoder field
//! by field.

pub mod decoder;
pub mod encoder;
pub mod error;
pub mod timestamp;
pub mod wire_type;

pub use decoder::{WireDecoder, MAX_VARINT_LEN};
pub use encoder::{zigzag_encode32, zigzag_encode64, WireEncoder};
pub use error::{Result, WireError};
pub use timestamp::Timestamp;
pub use wire_type::{FieldKey, WireType};

/// Tag wrapping each top-level record in an ingestion buffer.
pub const RECORD_TAG: u64 = 1;
