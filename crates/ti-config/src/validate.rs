//! Structural validation for config files and catalog bundles.
//!
//! Logical type names are not checked here; the type registry decides which
//! names exist and rejects unknown ones at ingest time.

use std::collections::HashSet;
use std::fmt;

use ti_common::RESERVED_TABLE_COLUMN;

use crate::catalog_bundle::StreamDef;
use crate::config::IngestConfig;

/// A single validation failure, addressed by a dotted path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Collected validation failures.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
}

impl ValidationResult {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    fn push(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    /// `Err` with all failures joined by `; ` when any were found.
    pub fn into_result(self) -> Result<(), String> {
        if self.is_ok() {
            return Ok(());
        }
        Err(self
            .errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; "))
    }
}

pub fn validate_config(config: &IngestConfig) -> ValidationResult {
    let mut result = ValidationResult::default();
    if config.output.batch_size == 0 {
        result.push("output.batch_size", "must be greater than 0");
    }
    if config.output.dir.as_os_str().is_empty() {
        result.push("output.dir", "must not be empty");
    }
    if config.logging.level.trim().is_empty() {
        result.push("logging.level", "must not be empty");
    }
    result
}

/// Check stream ids, table names and column lists.
pub fn validate_streams(streams: &[StreamDef]) -> ValidationResult {
    let mut result = ValidationResult::default();
    let mut seen_streams = HashSet::new();
    let mut seen_tables = HashSet::new();

    for (i, def) in streams.iter().enumerate() {
        let path = format!("streams[{}]", i);

        if def.stream.as_str().is_empty() {
            result.push(format!("{}.stream", path), "must not be empty");
        } else if !seen_streams.insert(def.stream.as_str()) {
            result.push(
                format!("{}.stream", path),
                format!("duplicate stream '{}'", def.stream),
            );
        }

        let table = def.table_name();
        if !seen_tables.insert(table.clone()) {
            result.push(
                format!("{}.table", path),
                format!("table '{}' already used by another stream", table),
            );
        }

        if def.columns.is_empty() {
            result.push(format!("{}.columns", path), "at least one column required");
        }

        let mut seen_columns = HashSet::new();
        for (j, col) in def.columns.iter().enumerate() {
            let col_path = format!("{}.columns[{}]", path, j);
            if col.name.trim().is_empty() {
                result.push(format!("{}.name", col_path), "must not be empty");
            } else if col.name == RESERVED_TABLE_COLUMN {
                result.push(
                    format!("{}.name", col_path),
                    format!("'{}' is reserved", RESERVED_TABLE_COLUMN),
                );
            } else if !seen_columns.insert(col.name.as_str()) {
                result.push(
                    format!("{}.name", col_path),
                    format!("duplicate column '{}'", col.name),
                );
            }
            if col.type_name.trim().is_empty() {
                result.push(format!("{}.type", col_path), "must not be empty");
            }
        }
    }

    result
}
