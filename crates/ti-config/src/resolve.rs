//! Config resolution: CLI → env → XDG → defaults.

use std::path::{Path, PathBuf};

use crate::config::{ConfigError, IngestConfig};

/// Env var naming a config file.
pub const CONFIG_ENV: &str = "TI_CONFIG";

/// Env var overriding `catalog.path`.
pub const CATALOG_ENV: &str = "TI_CATALOG";

/// Env var overriding `output.dir`.
pub const OUTPUT_DIR_ENV: &str = "TI_OUTPUT_DIR";

/// Where the effective configuration came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    Cli,
    Env,
    Xdg,
    Defaults,
}

/// Resolved config file location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigPaths {
    pub config_file: Option<PathBuf>,
    pub source: ConfigSource,
}

/// Resolve the effective configuration from the process environment.
pub fn resolve_config(cli_path: Option<&Path>) -> Result<(IngestConfig, ConfigPaths), ConfigError> {
    let xdg = dirs::config_dir().map(|d| d.join("ti").join("config.toml"));
    resolve_config_with(cli_path, |key| std::env::var(key).ok(), xdg.as_deref())
}

/// Resolution with injectable env lookup and XDG location.
///
/// An explicit CLI path or `TI_CONFIG` must exist; the XDG file is only used
/// when present.
pub fn resolve_config_with(
    cli_path: Option<&Path>,
    env: impl Fn(&str) -> Option<String>,
    xdg_path: Option<&Path>,
) -> Result<(IngestConfig, ConfigPaths), ConfigError> {
    let (file, source) = if let Some(path) = cli_path {
        (Some(path.to_path_buf()), ConfigSource::Cli)
    } else if let Some(path) = env(CONFIG_ENV).filter(|p| !p.is_empty()) {
        (Some(PathBuf::from(path)), ConfigSource::Env)
    } else if let Some(path) = xdg_path.filter(|p| p.is_file()) {
        (Some(path.to_path_buf()), ConfigSource::Xdg)
    } else {
        (None, ConfigSource::Defaults)
    };

    let mut config = match &file {
        Some(path) => IngestConfig::load(path)?,
        None => IngestConfig::default(),
    };

    if let Some(catalog) = env(CATALOG_ENV).filter(|p| !p.is_empty()) {
        config.catalog.path = Some(PathBuf::from(catalog));
    }
    if let Some(dir) = env(OUTPUT_DIR_ENV).filter(|p| !p.is_empty()) {
        config.output.dir = PathBuf::from(dir);
    }

    Ok((
        config,
        ConfigPaths {
            config_file: file,
            source,
        },
    ))
}
