//! Telemetry ingest configuration loading and validation.
//!
//! This crate provides:
//! - Typed Rust structs for the ingest config file (TOML)
//! - Config resolution (CLI → env → XDG → defaults)
//! - Versioned, hash-checked catalog bundles describing stream columns
//! - Structural validation of both

pub mod catalog_bundle;
pub mod config;
pub mod resolve;
pub mod validate;

pub use catalog_bundle::{CatalogBundle, CatalogBundleError, StreamDef};
pub use config::{
    CatalogSection, Compression, ConfigError, IngestConfig, LoggingSection, OutputSection,
};
pub use resolve::{resolve_config, ConfigPaths, ConfigSource};
pub use validate::{ValidationError, ValidationResult};
