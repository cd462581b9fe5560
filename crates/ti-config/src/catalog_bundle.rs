//! Catalog-as-Data: versioned, hash-checked stream column definitions.
//!
//! A `CatalogBundle` lists, for each stream, the target table and the
//! ordered columns with their logical type names. Column order is
//! significant: wire tags are 1-based positions in it.
//!
//! # Integrity
//!
//! On creation the bundle records the SHA-256 of its serialized `streams`.
//! Loading recomputes the hash and refuses a bundle whose stream list was
//! edited without refreshing it, since a reordered column list would
//! silently decode every record into the wrong columns.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;
use ti_common::schema::{is_compatible, CATALOG_FORMAT_VERSION};
use ti_common::{ColumnSchema, StreamId, TableName};

use crate::validate::validate_streams;

// ── Bundle types ────────────────────────────────────────────────────────

/// Column definitions for one stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamDef {
    pub stream: StreamId,

    /// Target table; derived from the stream id when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<TableName>,

    pub columns: ColumnSchema,
}

impl StreamDef {
    pub fn table_name(&self) -> TableName {
        self.table
            .clone()
            .unwrap_or_else(|| TableName::for_stream(&self.stream))
    }
}

/// A versioned catalog of stream definitions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogBundle {
    /// Bundle format version (for forward-compatible schema evolution).
    pub bundle_version: String,

    pub streams: Vec<StreamDef>,

    /// SHA-256 hash of the JSON-serialized `streams` field.
    /// Populated on bundle creation; verified on load.
    #[serde(default)]
    pub catalog_hash: Option<String>,
}

/// Errors that can occur during catalog bundle operations.
#[derive(Debug, thiserror::Error)]
pub enum CatalogBundleError {
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("catalog hash mismatch: expected {expected}, got {actual}")]
    HashMismatch { expected: String, actual: String },

    #[error("unsupported bundle version: {0}")]
    UnsupportedVersion(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid catalog: {0}")]
    Invalid(String),
}

impl From<CatalogBundleError> for ti_common::Error {
    fn from(e: CatalogBundleError) -> Self {
        match e {
            CatalogBundleError::Io(io) => ti_common::Error::Io(io),
            other => ti_common::Error::InvalidCatalog(other.to_string()),
        }
    }
}

// ── Bundle implementation ───────────────────────────────────────────────

impl CatalogBundle {
    /// Create a new bundle, computing the integrity hash.
    pub fn new(streams: Vec<StreamDef>) -> Result<Self, CatalogBundleError> {
        let hash = streams_hash(&streams)?;
        Ok(Self {
            bundle_version: CATALOG_FORMAT_VERSION.to_string(),
            streams,
            catalog_hash: Some(hash),
        })
    }

    /// Parse a bundle from JSON, verifying integrity.
    pub fn from_json(json: &str) -> Result<Self, CatalogBundleError> {
        let bundle: CatalogBundle = serde_json::from_str(json)?;
        bundle.verify_integrity()?;
        Ok(bundle)
    }

    /// Load from file with full error reporting.
    pub fn load_from_file(path: &Path) -> Result<Self, CatalogBundleError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Verify version, hash and structure.
    pub fn verify_integrity(&self) -> Result<(), CatalogBundleError> {
        if !is_compatible(&self.bundle_version) {
            return Err(CatalogBundleError::UnsupportedVersion(
                self.bundle_version.clone(),
            ));
        }

        if let Some(expected_hash) = &self.catalog_hash {
            let actual_hash = streams_hash(&self.streams)?;
            if *expected_hash != actual_hash {
                return Err(CatalogBundleError::HashMismatch {
                    expected: expected_hash.clone(),
                    actual: actual_hash,
                });
            }
        }

        validate_streams(&self.streams)
            .into_result()
            .map_err(CatalogBundleError::Invalid)
    }

    /// Look up a stream definition.
    pub fn stream(&self, id: &StreamId) -> Option<&StreamDef> {
        self.streams.iter().find(|def| def.stream == *id)
    }

    /// Recompute the hash after editing `streams`.
    pub fn refresh_hash(&mut self) -> Result<(), CatalogBundleError> {
        self.catalog_hash = Some(streams_hash(&self.streams)?);
        Ok(())
    }

    /// Serialize the bundle to JSON.
    pub fn to_json(&self) -> Result<String, CatalogBundleError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn streams_hash(streams: &[StreamDef]) -> Result<String, serde_json::Error> {
    let json = serde_json::to_string(streams)?;
    Ok(sha256_hex(json.as_bytes()))
}

/// Compute SHA-256 hex digest.
fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

// ── Tests ───────────────────────────────────────────────────────────────
