//! Shared fixtures: call logs, payloads, mock pipelines and exits.

use crate::adapters::Disposable;
use crate::errors::NanoflowError;
use crate::messaging::Payload;
use crate::nanos::Nano;
use crate::pipeline::{PipelineHandle, PipelineSchema};
use crate::service::ProcessExit;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::json;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// An ordered log shared between mocks to assert on call order.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry.
    pub fn record(&self, entry: impl Into<String>) {
        self.0.lock().push(entry.into());
    }

    /// Returns a copy of all entries.
    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        self.0.lock().clone()
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.lock().len()
    }

    /// Returns true if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.lock().is_empty()
    }
}

/// Builds a payload with a fresh request context.
#[must_use]
pub fn payload(data: serde_json::Value) -> Payload {
    Payload::from_origin(data, "test")
}

/// A pipeline stand-in with scriptable load and terminate outcomes.
#[derive(Debug)]
pub struct MockPipeline {
    name: String,
    load_failures: AtomicUsize,
    fail_terminate: AtomicBool,
    load_calls: AtomicUsize,
    dispose_calls: AtomicUsize,
    terminate_calls: AtomicUsize,
    nanos: Mutex<Vec<Arc<dyn Nano>>>,
    executed: Mutex<Vec<serde_json::Value>>,
}

impl MockPipeline {
    /// Creates a pipeline whose operations all succeed.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            load_failures: AtomicUsize::new(0),
            fail_terminate: AtomicBool::new(false),
            load_calls: AtomicUsize::new(0),
            dispose_calls: AtomicUsize::new(0),
            terminate_calls: AtomicUsize::new(0),
            nanos: Mutex::new(Vec::new()),
            executed: Mutex::new(Vec::new()),
        }
    }

    /// Creates a pipeline whose load always fails.
    #[must_use]
    pub fn failing_load(name: impl Into<String>) -> Self {
        Self::new(name).with_load_failures(usize::MAX)
    }

    /// Makes the first `count` loads fail.
    #[must_use]
    pub fn with_load_failures(self, count: usize) -> Self {
        self.load_failures.store(count, Ordering::SeqCst);
        self
    }

    /// Makes terminate fail.
    #[must_use]
    pub fn with_failing_terminate(self) -> Self {
        self.fail_terminate.store(true, Ordering::SeqCst);
        self
    }

    /// Returns how often `load` was called.
    #[must_use]
    pub fn load_count(&self) -> usize {
        self.load_calls.load(Ordering::SeqCst)
    }

    /// Returns how often `dispose` was called.
    #[must_use]
    pub fn dispose_count(&self) -> usize {
        self.dispose_calls.load(Ordering::SeqCst)
    }

    /// Returns how often `terminate` was called.
    #[must_use]
    pub fn terminate_count(&self) -> usize {
        self.terminate_calls.load(Ordering::SeqCst)
    }

    /// Returns the number of appended nanos.
    #[must_use]
    pub fn nano_count(&self) -> usize {
        self.nanos.lock().len()
    }

    /// Returns the bodies of executed messages.
    #[must_use]
    pub fn executed(&self) -> Vec<serde_json::Value> {
        self.executed.lock().clone()
    }
}

#[async_trait]
impl Disposable for MockPipeline {
    async fn dispose(&self) -> Result<(), NanoflowError> {
        self.dispose_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn terminate(&self) -> Result<(), NanoflowError> {
        self.terminate_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_terminate.load(Ordering::SeqCst) {
            return Err(NanoflowError::adapter(&self.name, "terminate failed"));
        }
        Ok(())
    }
}

#[async_trait]
impl PipelineHandle for MockPipeline {
    fn name(&self) -> &str {
        &self.name
    }

    async fn load(&self) -> Result<(), NanoflowError> {
        self.load_calls.fetch_add(1, Ordering::SeqCst);
        let remaining = self.load_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            if remaining != usize::MAX {
                self.load_failures.store(remaining - 1, Ordering::SeqCst);
            }
            return Err(NanoflowError::adapter(&self.name, "fake"));
        }
        Ok(())
    }

    fn add_nanos(&self, nanos: Vec<Arc<dyn Nano>>) {
        self.nanos.lock().extend(nanos);
    }

    fn schema(&self) -> PipelineSchema {
        PipelineSchema {
            input: json!({"pipeline": self.name}),
            output: json!({"pipeline": self.name}),
        }
    }

    async fn execute(&self, message: &mut Payload) {
        self.executed.lock().push(message.data.clone());
    }
}

/// Records exit requests instead of ending the process.
#[derive(Debug, Default)]
pub struct RecordingExit {
    codes: Mutex<Vec<i32>>,
}

impl RecordingExit {
    /// Creates a new recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every requested exit code.
    #[must_use]
    pub fn codes(&self) -> Vec<i32> {
        self.codes.lock().clone()
    }

    /// Returns the number of exit requests.
    #[must_use]
    pub fn exit_count(&self) -> usize {
        self.codes.lock().len()
    }
}

impl ProcessExit for RecordingExit {
    fn exit(&self, code: i32) {
        self.codes.lock().push(code);
    }
}
