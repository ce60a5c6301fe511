//! Error types for the nanoflow runtime.
//!
//! Errors fall into a handful of categories: context misuse, nano execution,
//! adapter lifecycle, configuration, service startup and wiring mistakes.
//! Every category has a dedicated struct so callers can match on it, and all
//! of them fold into [`NanoflowError`].

use serde_json::json;
use std::collections::HashMap;
use thiserror::Error;

/// The main error type for nanoflow operations.
#[derive(Debug, Error)]
pub enum NanoflowError {
    /// A scratch key was written twice within one execution context.
    #[error("{0}")]
    DuplicateKey(#[from] DuplicateKeyError),

    /// The request context backing an execution context is gone.
    #[error("{0}")]
    ContextUnavailable(#[from] ContextUnavailableError),

    /// A nano failed inside a pipeline.
    #[error("{0}")]
    NanoExecution(#[from] NanoExecutionError),

    /// An adapter was used before `attach`.
    #[error("{0}")]
    AdapterNotInitialized(#[from] AdapterNotInitializedError),

    /// A pipeline tried to send feedback without a feedback sink.
    #[error("{0}")]
    FeedbackNotConfigured(#[from] FeedbackNotConfiguredError),

    /// A configuration provider error.
    #[error("{0}")]
    Configuration(#[from] ConfigurationError),

    /// A service failed to start.
    #[error("{0}")]
    Startup(#[from] StartupError),

    /// A transport-level adapter failure.
    #[error("Adapter {adapter} failed: {message}")]
    Adapter {
        /// The adapter name.
        adapter: String,
        /// What went wrong.
        message: String,
    },

    /// A nano reported a failure with a plain message.
    #[error("{0}")]
    Nano(String),

    /// Shutdown signal handlers were already installed for this process.
    #[error("Shutdown handlers are already registered for this process")]
    ShutdownAlreadyRegistered,

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Any other error raised by user code.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl NanoflowError {
    /// Creates an adapter error.
    #[must_use]
    pub fn adapter(adapter: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Adapter {
            adapter: adapter.into(),
            message: message.into(),
        }
    }

    /// Creates a nano failure from a message.
    #[must_use]
    pub fn nano(message: impl Into<String>) -> Self {
        Self::Nano(message.into())
    }

    /// Returns true for programming errors that must never be retried.
    #[must_use]
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            Self::DuplicateKey(_)
                | Self::ContextUnavailable(_)
                | Self::AdapterNotInitialized(_)
                | Self::FeedbackNotConfigured(_)
                | Self::ShutdownAlreadyRegistered
        )
    }

    /// Converts to a dictionary representation for event payloads.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let kind = match self {
            Self::DuplicateKey(_) => "DuplicateKeyError",
            Self::ContextUnavailable(_) => "ContextUnavailableError",
            Self::NanoExecution(_) => "NanoExecutionError",
            Self::AdapterNotInitialized(_) => "AdapterNotInitializedError",
            Self::FeedbackNotConfigured(_) => "FeedbackNotConfiguredError",
            Self::Configuration(_) => "ConfigurationError",
            Self::Startup(_) => "StartupError",
            Self::Adapter { .. } => "AdapterError",
            Self::Nano(_) => "NanoError",
            Self::ShutdownAlreadyRegistered => "ShutdownAlreadyRegistered",
            Self::Serialization(_) => "SerializationError",
            Self::Io(_) => "IoError",
            Self::Other(_) => "Error",
        };

        let mut map = HashMap::new();
        map.insert("type".to_string(), json!(kind));
        map.insert("message".to_string(), json!(self.to_string()));
        map
    }
}

/// Raised when writing a key that already holds a value.
#[derive(Debug, Clone, Error)]
#[error("Key already exists: '{key}'")]
pub struct DuplicateKeyError {
    /// The conflicting key.
    pub key: String,
}

impl DuplicateKeyError {
    /// Creates a new duplicate key error.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

/// Raised when an execution context outlives its request context.
#[derive(Debug, Clone, Error)]
#[error("Request context for origin '{origin}' is no longer available")]
pub struct ContextUnavailableError {
    /// Origin of the execution context.
    pub origin: String,
}

impl ContextUnavailableError {
    /// Creates a new context unavailable error.
    #[must_use]
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
        }
    }
}

/// A failure inside a pipeline, annotated with the pipeline name.
#[derive(Debug, Error)]
#[error("Pipeline {pipeline} failed to execute with {source}")]
pub struct NanoExecutionError {
    /// The pipeline that failed.
    pub pipeline: String,
    /// The underlying failure.
    pub source: Box<NanoflowError>,
}

impl NanoExecutionError {
    /// Wraps a failure with the pipeline name.
    #[must_use]
    pub fn new(pipeline: impl Into<String>, source: NanoflowError) -> Self {
        Self {
            pipeline: pipeline.into(),
            source: Box::new(source),
        }
    }

    /// Returns the underlying failure.
    #[must_use]
    pub fn cause(&self) -> &NanoflowError {
        &self.source
    }
}

/// Which part of an adapter binding was accessed before `attach`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingPart {
    /// The back-reference to the owning pipeline.
    Pipeline,
    /// The shared configuration.
    Configuration,
}

impl std::fmt::Display for BindingPart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pipeline => write!(f, "Pipeline"),
            Self::Configuration => write!(f, "Configuration"),
        }
    }
}

/// Raised when an adapter touches its pipeline or configuration before `attach`.
#[derive(Debug, Clone, Error)]
#[error("{part} interface has not been initialized")]
pub struct AdapterNotInitializedError {
    /// The missing part.
    pub part: BindingPart,
}

impl AdapterNotInitializedError {
    /// Creates a new error for the given part.
    #[must_use]
    pub fn new(part: BindingPart) -> Self {
        Self { part }
    }
}

/// Raised when a pipeline has no feedback sink to report to.
#[derive(Debug, Clone, Error)]
#[error("No feedback set for pipeline {pipeline}, did you forget to add it to the pipeline constructor?")]
pub struct FeedbackNotConfiguredError {
    /// The mis-wired pipeline.
    pub pipeline: String,
}

impl FeedbackNotConfiguredError {
    /// Creates a new error for the given pipeline.
    #[must_use]
    pub fn new(pipeline: impl Into<String>) -> Self {
        Self {
            pipeline: pipeline.into(),
        }
    }
}

/// Errors raised by configuration providers.
#[derive(Debug, Clone, Error)]
pub enum ConfigurationError {
    /// No value is stored under the name.
    #[error("Configuration value not found: {name}")]
    NotFound {
        /// The configuration name.
        name: String,
    },

    /// The stored value could not be used as requested.
    #[error("Invalid configuration value for {name}: {reason}")]
    Invalid {
        /// The configuration name.
        name: String,
        /// Why it is invalid.
        reason: String,
    },

    /// The provider could not load its values.
    #[error("Configuration fetch failed: {0}")]
    Fetch(String),
}

impl ConfigurationError {
    /// Creates a not found error.
    #[must_use]
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }

    /// Creates an invalid value error.
    #[must_use]
    pub fn invalid(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// Raised when the startup tasks of a service fail.
#[derive(Debug, Clone, Error)]
#[error("Service {service} failed to load with error: {message}")]
pub struct StartupError {
    /// The service name.
    pub service: String,
    /// The underlying failure message.
    pub message: String,
}

impl StartupError {
    /// Creates a new startup error.
    #[must_use]
    pub fn new(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            message: message.into(),
        }
    }
}
