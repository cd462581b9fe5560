//! Ingest configuration file.
//!
//! ```toml
//! [catalog]
//! path = "/etc/ti/catalog.json"
//!
//! [output]
//! format = "parquet"
//! dir = "/var/lib/ti"
//! batch_size = 1000
//! compression = "zstd"
//!
//! [logging]
//! format = "json"
//! level = "info"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use ti_common::{LogFormat, OutputFormat};

use crate::validate::validate_config;

/// Default rows per Parquet batch.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Default output directory for file sinks.
pub const DEFAULT_OUTPUT_DIR: &str = "ti-output";

/// Errors from loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl From<ConfigError> for ti_common::Error {
    fn from(e: ConfigError) -> Self {
        ti_common::Error::Config(e.to_string())
    }
}

/// Top-level ingest configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IngestConfig {
    pub catalog: CatalogSection,
    pub output: OutputSection,
    pub logging: LoggingSection,
}

/// Where stream column definitions come from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CatalogSection {
    /// Catalog bundle (JSON). Required by commands that touch a stream.
    pub path: Option<PathBuf>,
}

/// Row output settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputSection {
    pub format: OutputFormat,

    /// Root directory for Parquet output.
    pub dir: PathBuf,

    /// Rows buffered per table before a Parquet batch is written.
    pub batch_size: usize,

    pub compression: Compression,
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            batch_size: DEFAULT_BATCH_SIZE,
            compression: Compression::default(),
        }
    }
}

/// Parquet page compression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    #[default]
    Zstd,
    Snappy,
    None,
}

/// Logging settings; CLI flags and `RUST_LOG` take precedence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingSection {
    pub format: LogFormat,
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            level: "info".to_string(),
        }
    }
}

impl IngestConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: IngestConfig = toml::from_str(s)?;
        validate_config(&config)
            .into_result()
            .map_err(ConfigError::Invalid)?;
        Ok(config)
    }

    /// Load and validate a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_gives_defaults() {
        let config = IngestConfig::from_toml_str("").unwrap();
        assert_eq!(config, IngestConfig::default());
        assert_eq!(config.output.batch_size, DEFAULT_BATCH_SIZE);
        assert_eq!(config.output.format, OutputFormat::Jsonl);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn full_document_parses() {
        let config = IngestConfig::from_toml_str(
            r#"
            [catalog]
            path = "/etc/ti/catalog.json"

            [output]
            format = "parquet"
            dir = "/var/lib/ti"
            batch_size = 50
            compression = "snappy"

            [logging]
            format = "json"
            level = "debug"
            "#,
        )
        .unwrap();
        assert_eq!(
            config.catalog.path.as_deref(),
            Some(Path::new("/etc/ti/catalog.json"))
        );
        assert_eq!(config.output.format, OutputFormat::Parquet);
        assert_eq!(config.output.batch_size, 50);
        assert_eq!(config.output.compression, Compression::Snappy);
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn unknown_keys_rejected() {
        let err = IngestConfig::from_toml_str("[output]\nbatchsize = 5\n").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn zero_batch_size_rejected() {
        let err = IngestConfig::from_toml_str("[output]\nbatch_size = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn load_missing_file_reports_path() {
        let err = IngestConfig::load(Path::new("/nonexistent/ti.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/ti.toml"));
    }
}
