//! Logging setup for the command-line runner.
//!
//! `RUST_LOG` wins over the level passed in, so
//! `RUST_LOG=contextflow::interpolation=trace` works without code changes.

use tracing_subscriber::EnvFilter;

/// Output format of log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Builds the filter: `RUST_LOG` if set and valid, else `default_level`.
#[must_use]
pub fn filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Installs the global subscriber writing to stderr.
///
/// Calling it again is a no-op, so tests and embedders may call it freely.
pub fn init_logging(default_level: &str, format: LogFormat) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter(default_level))
        .with_writer(std::io::stderr)
        .with_target(false);

    let _ = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}
