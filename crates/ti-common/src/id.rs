//! Stream, table and ingestion identity types.
//!
//! A stream is the unit the catalog describes; each stream lands in exactly
//! one table.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

use crate::error::{Error, Result};

/// Maximum table identifier length accepted by common SQL engines.
pub const MAX_TABLE_NAME_LEN: usize = 64;

fn table_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("table name pattern is valid")
    })
}

/// Identifier of an attribute stream, as used by the column catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StreamId(pub String);

impl StreamId {
    pub fn new(id: impl Into<String>) -> Self {
        StreamId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for StreamId {
    fn from(id: &str) -> Self {
        StreamId(id.to_string())
    }
}

/// Validated SQL table identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TableName(String);

impl TableName {
    /// Parse and validate a table name.
    pub fn parse(s: &str) -> Result<Self> {
        if s.len() > MAX_TABLE_NAME_LEN || !table_name_pattern().is_match(s) {
            return Err(Error::InvalidTableName(s.to_string()));
        }
        Ok(TableName(s.to_string()))
    }

    /// Derive a table name from a stream id: characters outside
    /// `[A-Za-z0-9_]` become `_`, a leading digit gets a `_` prefix, and the
    /// result is truncated to [`MAX_TABLE_NAME_LEN`].
    pub fn for_stream(stream: &StreamId) -> Self {
        let mut name: String = stream
            .as_str()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
            .collect();
        if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) {
            name.insert(0, '_');
        }
        name.truncate(MAX_TABLE_NAME_LEN);
        TableName(name)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TableName {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        TableName::parse(&s)
    }
}

impl From<TableName> for String {
    fn from(name: TableName) -> Self {
        name.0
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of one ingestion run, used to name output files.
///
/// Format: `ing-<date>-<time>-<random>`
/// Example: `ing-20260115-143022-abc123`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IngestId(pub String);

impl IngestId {
    /// Generate a new ingestion ID.
    pub fn new() -> Self {
        let now = chrono::Utc::now();
        let random: String = uuid::Uuid::new_v4()
            .simple()
            .to_string()
            .chars()
            .take(6)
            .collect();
        IngestId(format!("ing-{}-{}", now.format("%Y%m%d-%H%M%S"), random))
    }

    /// Parse an existing ingestion ID string.
    pub fn parse(s: &str) -> Option<Self> {
        if s.starts_with("ing-") && s.len() > 19 {
            Some(IngestId(s.to_string()))
        } else {
            None
        }
    }
}

impl Default for IngestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for IngestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
