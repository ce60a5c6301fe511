//! Request-scoped context shared across pipeline hops.

use super::ExecutionContext;
use crate::utils::{duration_ms, generate_uuid, iso_timestamp, now_utc, Timestamp};
use parking_lot::RwLock;
use serde_json::json;
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

/// The broader context of a request as it travels through pipelines.
///
/// Every pipeline hop records its completed [`ExecutionContext`] here, which
/// makes end-to-end latency accounting possible.
#[derive(Debug)]
pub struct RequestContext {
    id: String,
    origin: String,
    start_time: Instant,
    started_at: Timestamp,
    end_time: OnceLock<Instant>,
    execution_contexts: RwLock<Vec<Arc<ExecutionContext>>>,
}

impl RequestContext {
    /// Creates a request context with a generated id.
    #[must_use]
    pub fn new(origin: impl Into<String>) -> Self {
        Self::with_id(generate_uuid().to_string(), origin)
    }

    /// Creates a request context with an explicit id.
    #[must_use]
    pub fn with_id(id: impl Into<String>, origin: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            origin: origin.into(),
            start_time: Instant::now(),
            started_at: now_utc(),
            end_time: OnceLock::new(),
            execution_contexts: RwLock::new(Vec::new()),
        }
    }

    /// Returns the request id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns where the request came from.
    #[must_use]
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Returns when the request started.
    #[must_use]
    pub fn start_time(&self) -> Instant {
        self.start_time
    }

    /// Returns when the request ended, if it has.
    #[must_use]
    pub fn end_time(&self) -> Option<Instant> {
        self.end_time.get().copied()
    }

    /// Marks the request as finished. Only the first call has an effect.
    pub fn complete(&self) -> bool {
        self.end_time.set(Instant::now()).is_ok()
    }

    /// Appends a completed execution to the history.
    pub fn push_execution_context(&self, ctx: ExecutionContext) {
        self.execution_contexts.write().push(Arc::new(ctx));
    }

    /// Returns the execution history in hop order.
    #[must_use]
    pub fn execution_contexts(&self) -> Vec<Arc<ExecutionContext>> {
        self.execution_contexts.read().clone()
    }

    /// Returns the number of recorded hops.
    #[must_use]
    pub fn hop_count(&self) -> usize {
        self.execution_contexts.read().len()
    }

    /// Total time of the request, or the time elapsed so far.
    #[must_use]
    pub fn request_time(&self) -> Duration {
        match self.end_time.get() {
            Some(end) => end.saturating_duration_since(self.start_time),
            None => self.start_time.elapsed(),
        }
    }

    /// Average execution time over all recorded hops.
    #[must_use]
    pub fn average_execution_time(&self) -> Duration {
        let contexts = self.execution_contexts.read();
        average(contexts.iter().map(|ctx| ctx.duration()))
    }

    /// Average time between one hop ending and the next one starting.
    #[must_use]
    pub fn average_execution_latency(&self) -> Duration {
        let contexts = self.execution_contexts.read();
        let gaps = contexts.windows(2).filter_map(|pair| {
            let previous_end = pair[0].end_time()?;
            Some(pair[1].start_time().saturating_duration_since(previous_end))
        });
        average(gaps)
    }

    /// Returns a JSON summary of the request.
    #[must_use]
    pub fn to_value(&self) -> serde_json::Value {
        let executions: Vec<_> = self
            .execution_contexts
            .read()
            .iter()
            .map(|ctx| ctx.to_value())
            .collect();

        json!({
            "id": self.id,
            "origin": self.origin,
            "startedAt": iso_timestamp(&self.started_at),
            "requestTimeMs": duration_ms(self.request_time()),
            "averageExecutionTimeMs": duration_ms(self.average_execution_time()),
            "averageExecutionLatencyMs": duration_ms(self.average_execution_latency()),
            "executions": executions,
        })
    }
}

fn average(durations: impl Iterator<Item = Duration>) -> Duration {
    let (total, count) = durations.fold((Duration::ZERO, 0u32), |(total, count), d| {
        (total + d, count + 1)
    });

    if count == 0 {
        Duration::ZERO
    } else {
        total / count
    }
}
