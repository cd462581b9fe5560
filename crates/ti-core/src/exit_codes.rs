//! Exit codes for the ti-core CLI.
//!
//! Exit codes communicate the outcome without requiring output parsing.
//! They are stable.

use ti_common::Error;

/// Exit codes for ti-core operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Completed without error
    Clean = 0,

    /// Ingestion failed after some rows were already committed
    PartialIngest = 3,

    /// Configuration or catalog error
    ConfigError = 10,

    /// Malformed wire data
    DecodeError = 11,

    /// Unknown stream, unknown type name, or row shape error
    SchemaError = 12,

    /// I/O error
    IoError = 13,

    /// Row sink rejected a row
    SinkError = 14,

    /// Internal/unknown error
    InternalError = 99,
}

impl ExitCode {
    /// Convert to i32 for process exit.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Check if this exit code indicates success.
    pub fn is_success(self) -> bool {
        matches!(self, ExitCode::Clean)
    }

    /// Check if this exit code indicates an error requiring attention.
    pub fn is_error(self) -> bool {
        (self as i32) >= 10
    }

    /// Exit code for an error, by its code decade.
    pub fn for_error(err: &Error) -> Self {
        match err.code() {
            10..=19 => ExitCode::ConfigError,
            20..=29 => ExitCode::DecodeError,
            30..=39 => ExitCode::SchemaError,
            40..=49 => ExitCode::SinkError,
            60..=69 => ExitCode::IoError,
            _ => ExitCode::InternalError,
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}
