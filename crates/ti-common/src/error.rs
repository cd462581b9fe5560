//! Error types for telemetry ingestion.

use thiserror::Error;
use ti_wire::WireError;

/// Result type alias for ingest operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for telemetry ingestion.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (10-19)
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid catalog: {0}")]
    InvalidCatalog(String),

    // Decode errors (20-29)
    #[error("malformed wire data: {0}")]
    Wire(#[from] WireError),

    #[error("invalid field {tag}: {reason}")]
    InvalidField { tag: u64, reason: String },

    // Schema errors (30-39)
    #[error("invalid logical type: {name}")]
    InvalidType { name: String },

    #[error("unknown stream: {stream}")]
    UnknownStream { stream: String },

    #[error("invalid table name: {0}")]
    InvalidTableName(String),

    #[error("schema validation failed: {0}")]
    SchemaValidation(String),

    // Sink errors (40-49)
    #[error("row sink failed: {0}")]
    Sink(String),

    #[error("value does not fit column {column}: {reason}")]
    ValueMismatch { column: String, reason: String },

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns the error code for this error type.
    /// Used for detailed error reporting in JSON output.
    pub fn code(&self) -> u32 {
        match self {
            Error::Config(_) => 10,
            Error::InvalidCatalog(_) => 11,
            Error::Wire(WireError::UnexpectedEnd { .. }) => 20,
            Error::Wire(WireError::Overflow { .. }) => 21,
            Error::Wire(WireError::BadWireType { .. }) => 22,
            Error::Wire(WireError::BadTag { .. }) => 23,
            Error::InvalidField { .. } => 24,
            Error::InvalidType { .. } => 30,
            Error::UnknownStream { .. } => 31,
            Error::InvalidTableName(_) => 32,
            Error::SchemaValidation(_) => 33,
            Error::Sink(_) => 40,
            Error::ValueMismatch { .. } => 41,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
        }
    }

    /// Malformed input rather than a configuration or environment problem.
    pub fn is_decode_error(&self) -> bool {
        matches!(self, Error::Wire(_) | Error::InvalidField { .. })
    }

    pub fn invalid_field(tag: u64, reason: impl Into<String>) -> Self {
        Error::InvalidField {
            tag,
            reason: reason.into(),
        }
    }

    pub fn invalid_type(name: impl Into<String>) -> Self {
        Error::InvalidType { name: name.into() }
    }
}
