//! Lifecycle events emitted by pipelines and services.
//!
//! Events complement the `tracing` logs with machine-readable records that
//! tests and monitoring can consume through an [`EventSink`].

mod sink;

pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};

use parking_lot::RwLock;
use std::sync::Arc;

/// Event type names.
pub mod names {
    /// A message went through every nano and was sent.
    pub const PIPELINE_EXECUTION_COMPLETED: &str = "pipeline.execution.completed";
    /// A message failed and was routed to feedback.
    pub const PIPELINE_EXECUTION_FAILED: &str = "pipeline.execution.failed";
    /// A message arrived after the pipeline started draining.
    pub const PIPELINE_EXECUTION_DENIED: &str = "pipeline.execution.denied";
    /// Both adapters of a pipeline were released.
    pub const PIPELINE_RELEASED: &str = "pipeline.released";
    /// A startup attempt began.
    pub const SERVICE_STARTING: &str = "service.starting";
    /// A startup attempt failed and will be retried.
    pub const SERVICE_START_ATTEMPT_FAILED: &str = "service.start_attempt_failed";
    /// The startup retry budget ran out.
    pub const SERVICE_STARTUP_EXHAUSTED: &str = "service.startup_exhausted";
    /// Every startup task and pipeline load succeeded.
    pub const SERVICE_RUNNING: &str = "service.running";
    /// Graceful termination began.
    pub const SERVICE_TERMINATING: &str = "service.terminating";
    /// Graceful termination finished and exit was requested.
    pub const SERVICE_TERMINATED: &str = "service.terminated";
}

static GLOBAL_EVENT_SINK: RwLock<Option<Arc<dyn EventSink>>> = RwLock::new(None);

/// Sets the process-wide default event sink.
pub fn set_event_sink(sink: Arc<dyn EventSink>) {
    *GLOBAL_EVENT_SINK.write() = Some(sink);
}

/// Clears the process-wide default event sink.
pub fn clear_event_sink() {
    *GLOBAL_EVENT_SINK.write() = None;
}

/// Gets the process-wide default event sink.
///
/// Falls back to a [`NoOpEventSink`] when none is set.
pub fn get_event_sink() -> Arc<dyn EventSink> {
    GLOBAL_EVENT_SINK
        .read()
        .clone()
        .unwrap_or_else(|| Arc::new(NoOpEventSink))
}
