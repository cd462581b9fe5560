//! Tracing subscriber setup.
//!
//! Log lines go to stderr so stdout stays free for row output. `RUST_LOG`,
//! when set, takes precedence over the configured level.

use ti_common::{Error, LogFormat, Result};
use tracing::Level;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Level implied by `-v` flags on top of the configured level.
///
/// The flags only ever raise verbosity: a configured level already more
/// verbose than the flags ask for is kept. Configured filter directives
/// that are not a plain level are replaced by the flag level.
pub fn effective_level(configured: &str, verbose: u8) -> String {
    let requested = match verbose {
        0 => return configured.to_string(),
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    match configured.trim().parse::<Level>() {
        Ok(level) if level > requested => level.as_str().to_ascii_lowercase(),
        _ => requested.as_str().to_ascii_lowercase(),
    }
}

fn build_filter(level: &str) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(level)
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| Error::Config(format!("invalid log level {level:?}: {e}")))
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(format: LogFormat, level: &str) -> Result<()> {
    let filter = build_filter(level)?;
    let registry = tracing_subscriber::registry().with(filter);
    let installed = match format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Text => registry
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .try_init(),
    };
    installed.map_err(|e| Error::Config(format!("failed to install logger: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_raises_level() {
        assert_eq!(effective_level("warn", 0), "warn");
        assert_eq!(effective_level("warn", 1), "debug");
        assert_eq!(effective_level("warn", 3), "trace");
    }

    #[test]
    fn verbosity_never_lowers_configured_level() {
        assert_eq!(effective_level("trace", 1), "trace");
        assert_eq!(effective_level("TRACE", 1), "trace");
        assert_eq!(effective_level("debug", 1), "debug");
        assert_eq!(effective_level("trace", 2), "trace");
        assert_eq!(effective_level("ti_core=warn", 1), "debug");
    }

    #[test]
    fn bad_level_falls_back() {
        assert!(build_filter("info").is_ok());
        assert!(build_filter("not a [level").is_ok());
    }
}
