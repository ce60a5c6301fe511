//! Per-message execution context.

use super::{ContextBag, RequestContext};
use crate::errors::{ContextUnavailableError, DuplicateKeyError};
use crate::utils::{duration_ms, iso_timestamp, now_utc, Timestamp};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::sync::{Arc, OnceLock, Weak};
use std::time::{Duration, Instant};

/// Reserved scratch key holding the name of the executing pipeline.
pub const PIPELINE_NAME_KEY: &str = "pipelineName";

/// Reserved scratch key whose value replaces the message body on success.
pub const OUTPUT_KEY: &str = "output";

/// The context created for each pipeline traversal of a message.
///
/// Holds the transient data shared between nanos, timing measurements and a
/// read-only reference to the request context the message belongs to. Scratch
/// data is write-once: a nano can never overwrite what another nano stored.
#[derive(Debug)]
pub struct ExecutionContext {
    id: String,
    origin: String,
    start_time: Instant,
    started_at: Timestamp,
    end_time: OnceLock<Instant>,
    data: ContextBag,
    request_context: Weak<RequestContext>,
}

impl ExecutionContext {
    /// Creates a new context for the given origin.
    ///
    /// The id stays empty until the caller assigns one.
    #[must_use]
    pub fn new(origin: impl Into<String>, request_context: &Arc<RequestContext>) -> Self {
        Self {
            id: String::new(),
            origin: origin.into(),
            start_time: Instant::now(),
            started_at: now_utc(),
            end_time: OnceLock::new(),
            data: ContextBag::new(),
            request_context: Arc::downgrade(request_context),
        }
    }

    /// Assigns the context id.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Assigns the context id in place.
    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = id.into();
    }

    /// Returns the context id (empty if never assigned).
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the origin of the call.
    #[must_use]
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Returns when the execution started.
    #[must_use]
    pub fn start_time(&self) -> Instant {
        self.start_time
    }

    /// Returns the wall-clock start of the execution.
    #[must_use]
    pub fn started_at(&self) -> Timestamp {
        self.started_at
    }

    /// Returns when the execution completed, if it has.
    #[must_use]
    pub fn end_time(&self) -> Option<Instant> {
        self.end_time.get().copied()
    }

    /// Returns true once `complete` has been called.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.end_time.get().is_some()
    }

    /// Stamps the end time.
    ///
    /// Only the first call has an effect; returns false on later calls.
    pub fn complete(&self) -> bool {
        self.end_time.set(Instant::now()).is_ok()
    }

    /// Returns the execution time, or the time elapsed so far while running.
    #[must_use]
    pub fn duration(&self) -> Duration {
        match self.end_time.get() {
            Some(end) => end.saturating_duration_since(self.start_time),
            None => self.start_time.elapsed(),
        }
    }

    /// Gets a scratch value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<serde_json::Value> {
        self.data.get(key)
    }

    /// Gets a scratch value deserialized into `T`.
    #[must_use]
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.data.get_as(key)
    }

    /// Checks if a scratch key has been written.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Stores a scratch value.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateKeyError` if the key was already written.
    pub fn set(&self, key: impl Into<String>, value: serde_json::Value) -> Result<(), DuplicateKeyError> {
        self.data.set(key, value)
    }

    /// Returns the scratch data bag.
    #[must_use]
    pub fn data(&self) -> &ContextBag {
        &self.data
    }

    /// Returns the owning request context.
    ///
    /// # Errors
    ///
    /// Returns `ContextUnavailableError` if the request context was dropped.
    pub fn request_context(&self) -> Result<Arc<RequestContext>, ContextUnavailableError> {
        self.request_context
            .upgrade()
            .ok_or_else(|| ContextUnavailableError::new(&self.origin))
    }

    /// Returns the pipeline name recorded under the reserved key.
    #[must_use]
    pub fn pipeline_name(&self) -> Option<String> {
        self.get_as(PIPELINE_NAME_KEY)
    }

    /// Returns a JSON snapshot of the context.
    #[must_use]
    pub fn to_value(&self) -> serde_json::Value {
        json!({
            "id": self.id,
            "origin": self.origin,
            "startedAt": iso_timestamp(&self.started_at),
            "durationMs": self.end_time.get().map(|_| duration_ms(self.duration())),
            "data": self.data.to_dict(),
        })
    }
}
