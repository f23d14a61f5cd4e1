//! Subscriber setup for the `xgesture` binary.
//!
//! The library only emits events; installing a subscriber is left to the
//! application. Logs go to stderr so decoded records on stdout stay clean.
//!
//! ```ignore
//! use xgesture_client::tracing::{init_tracing, TracingConfig};
//!
//! init_tracing(TracingConfig::cli())?;
//! ```

use thiserror::Error;
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Errors that can occur during tracing initialization
#[derive(Debug, Error)]
pub enum TracingError {
    /// Failed to set global subscriber
    #[error("failed to set global tracing subscriber: {0}")]
    SetGlobalSubscriber(#[from] tracing::subscriber::SetGlobalDefaultError),

    /// Failed to parse env filter directive
    #[error("failed to parse env filter: {0}")]
    EnvFilter(#[from] tracing_subscriber::filter::ParseError),
}

/// Output format for log lines
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TracingOutputFormat {
    /// Multi-line human-readable format
    Pretty,
    /// Single-line format (default)
    #[default]
    Compact,
    /// One JSON object per line
    Json,
}

/// Configuration for tracing initialization
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Level for this crate's targets when RUST_LOG is not set
    pub default_level: Level,
    pub output_format: TracingOutputFormat,
    /// Whether to include file/line information
    pub include_location: bool,
    /// Whether to include the module path
    pub include_target: bool,
    /// Custom env filter directive (overrides default_level if set)
    pub env_filter: Option<String>,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self::cli()
    }
}

impl TracingConfig {
    /// Quiet preset: warnings only.
    #[must_use]
    pub fn cli() -> Self {
        Self {
            default_level: Level::WARN,
            output_format: TracingOutputFormat::Compact,
            include_location: false,
            include_target: false,
            env_filter: None,
        }
    }

    /// Preset for `--debug`: debug level with source locations.
    #[must_use]
    pub fn cli_debug() -> Self {
        Self {
            default_level: Level::DEBUG,
            output_format: TracingOutputFormat::Compact,
            include_location: true,
            include_target: true,
            env_filter: None,
        }
    }

    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.default_level = level;
        self
    }

    #[must_use]
    pub fn with_format(mut self, format: TracingOutputFormat) -> Self {
        self.output_format = format;
        self
    }

    /// Set a custom env filter directive
    #[must_use]
    pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    /// Directive used when neither `env_filter` nor RUST_LOG is set.
    pub fn default_directive(&self) -> String {
        format!(
            "xgesture={level},xgesture_client={level},xgesture_protocol={level}",
            level = self.default_level
        )
    }
}

/// Installs the global subscriber.
///
/// `RUST_LOG` overrides the configured level unless an explicit filter was
/// given.
///
/// # Errors
///
/// Returns an error if a global subscriber is already set or the filter
/// directive does not parse.
pub fn init_tracing(config: TracingConfig) -> Result<(), TracingError> {
    let env_filter = if let Some(ref filter) = config.env_filter {
        EnvFilter::try_new(filter)?
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config.default_directive()))
    };

    match config.output_format {
        TracingOutputFormat::Pretty => {
            let subscriber = tracing_subscriber::registry().with(env_filter).with(
                fmt::layer()
                    .pretty()
                    .with_writer(std::io::stderr)
                    .with_file(config.include_location)
                    .with_line_number(config.include_location)
                    .with_target(config.include_target),
            );
            tracing::subscriber::set_global_default(subscriber)?;
        }
        TracingOutputFormat::Compact => {
            let subscriber = tracing_subscriber::registry().with(env_filter).with(
                fmt::layer()
                    .compact()
                    .without_time()
                    .with_writer(std::io::stderr)
                    .with_file(config.include_location)
                    .with_line_number(config.include_location)
                    .with_target(config.include_target),
            );
            tracing::subscriber::set_global_default(subscriber)?;
        }
        TracingOutputFormat::Json => {
            let subscriber = tracing_subscriber::registry().with(env_filter).with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_file(config.include_location)
                    .with_line_number(config.include_location)
                    .with_target(config.include_target),
            );
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }

    Ok(())
}
