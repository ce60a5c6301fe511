//! Installs the global `tracing` subscriber.

use crate::config::{LogFormat, LoggingConfig};
use crate::errors::{ConfigurationError, NanoflowError};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Builds the filter from `RUST_LOG`, falling back to the configured level.
///
/// # Errors
///
/// Returns `ConfigurationError::Invalid` if the fallback directive is malformed.
pub fn build_filter(config: &LoggingConfig) -> Result<EnvFilter, ConfigurationError> {
    match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(directives) if !directives.trim().is_empty() => EnvFilter::try_new(directives)
            .map_err(|e| ConfigurationError::invalid(EnvFilter::DEFAULT_ENV, e.to_string())),
        _ => EnvFilter::try_new(&config.level)
            .map_err(|e| ConfigurationError::invalid("log_level", e.to_string())),
    }
}

/// Installs a registry with an env filter and a pretty or JSON fmt layer.
///
/// # Errors
///
/// Fails if the filter is invalid or a global subscriber is already set.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), NanoflowError> {
    let filter = build_filter(config)?;

    let (pretty, json) = match config.format {
        LogFormat::Pretty => (Some(fmt::layer().with_target(true)), None),
        LogFormat::Json => (None, Some(fmt::layer().json().with_current_span(true))),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(pretty)
        .with(json)
        .try_init()
        .map_err(|e| NanoflowError::Other(anyhow::anyhow!("failed to install tracing subscriber: {e}")))
}
