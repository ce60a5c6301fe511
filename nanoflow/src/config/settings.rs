//! Service settings with defaults and environment overrides.

use crate::errors::ConfigurationError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable output.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigurationError::invalid(
                "log_format",
                format!("unknown log format '{other}'"),
            )),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

/// How a service retries its startup batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartupPolicy {
    /// Retries allowed after the first failed attempt.
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
    /// Fixed delay between attempts in milliseconds.
    #[serde(default = "default_retry_interval_ms")]
    pub retry_interval_ms: u64,
}

fn default_retry_attempts() -> u32 {
    10
}

fn default_retry_interval_ms() -> u64 {
    5000
}

impl Default for StartupPolicy {
    fn default() -> Self {
        Self {
            retry_attempts: default_retry_attempts(),
            retry_interval_ms: default_retry_interval_ms(),
        }
    }
}

impl StartupPolicy {
    /// Creates a policy.
    #[must_use]
    pub fn new(retry_attempts: u32, retry_interval: Duration) -> Self {
        Self {
            retry_attempts,
            retry_interval_ms: u64::try_from(retry_interval.as_millis()).unwrap_or(u64::MAX),
        }
    }

    /// Returns the delay between attempts.
    #[must_use]
    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }
}

/// Settings describing a service instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSettings {
    /// The service name.
    pub service_name: String,
    /// Port exposed by the hosting process.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Startup retry policy.
    #[serde(default)]
    pub startup: StartupPolicy,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_port() -> u16 {
    80
}

impl ServiceSettings {
    /// Creates settings with defaults for everything but the name.
    #[must_use]
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            port: default_port(),
            startup: StartupPolicy::default(),
            logging: LoggingConfig::default(),
        }
    }

    /// Sets the port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the startup policy.
    #[must_use]
    pub fn with_startup(mut self, startup: StartupPolicy) -> Self {
        self.startup = startup;
        self
    }

    /// Sets the logging configuration.
    #[must_use]
    pub fn with_logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = logging;
        self
    }

    /// Builds settings from `NANOFLOW_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::Invalid` for values that do not parse.
    pub fn from_env(default_name: &str) -> Result<Self, ConfigurationError> {
        Self::from_lookup(default_name, |key| std::env::var(key).ok())
    }

    /// Builds settings from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::Invalid` for values that do not parse.
    pub fn from_lookup<F>(default_name: &str, lookup: F) -> Result<Self, ConfigurationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings =
            Self::new(lookup("NANOFLOW_SERVICE_NAME").unwrap_or_else(|| default_name.to_string()));

        if let Some(port) = lookup("NANOFLOW_PORT") {
            settings.port = parse_var("NANOFLOW_PORT", &port)?;
        }
        if let Some(attempts) = lookup("NANOFLOW_RETRY_ATTEMPTS") {
            settings.startup.retry_attempts = parse_var("NANOFLOW_RETRY_ATTEMPTS", &attempts)?;
        }
        if let Some(interval) = lookup("NANOFLOW_RETRY_INTERVAL_MS") {
            settings.startup.retry_interval_ms = parse_var("NANOFLOW_RETRY_INTERVAL_MS", &interval)?;
        }
        if let Some(level) = lookup("NANOFLOW_LOG_LEVEL") {
            settings.logging.level = level;
        }
        if let Some(format) = lookup("NANOFLOW_LOG_FORMAT") {
            settings.logging.format = format.parse()?;
        }

        Ok(settings)
    }
}

fn parse_var<T>(name: &str, raw: &str) -> Result<T, ConfigurationError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e: T::Err| ConfigurationError::invalid(name, e.to_string()))
}
