//! Mock adapters and feedback sinks.

use super::CallLog;
use crate::adapters::{
    Adapter, AdapterBinding, Disposable, FeedbackSink, InputAdapter, MessageHandler, OutputAdapter,
};
use crate::config::Configuration;
use crate::errors::NanoflowError;
use crate::messaging::Payload;
use crate::pipeline::PipelineHandle;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::json;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

#[derive(Debug, Default)]
struct Counters {
    connect: AtomicUsize,
    dispose: AtomicUsize,
    terminate: AtomicUsize,
}

/// An input adapter driven by the test through [`MockInputAdapter::deliver`].
pub struct MockInputAdapter {
    binding: AdapterBinding,
    handler: Mutex<Option<MessageHandler>>,
    fail_connect: AtomicBool,
    counters: Counters,
}

impl Default for MockInputAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl MockInputAdapter {
    /// Creates a new input adapter.
    #[must_use]
    pub fn new() -> Self {
        Self {
            binding: AdapterBinding::new(json!({"kind": "mock-input"})),
            handler: Mutex::new(None),
            fail_connect: AtomicBool::new(false),
            counters: Counters::default(),
        }
    }

    /// Makes `connect` fail.
    pub fn set_fail_connect(&self, fail: bool) {
        self.fail_connect.store(fail, Ordering::SeqCst);
    }

    /// Returns the binding.
    #[must_use]
    pub fn binding(&self) -> &AdapterBinding {
        &self.binding
    }

    /// Returns true once a receive handler is registered.
    #[must_use]
    pub fn has_handler(&self) -> bool {
        self.handler.lock().is_some()
    }

    /// Returns how often `connect` was called.
    #[must_use]
    pub fn connect_count(&self) -> usize {
        self.counters.connect.load(Ordering::SeqCst)
    }

    /// Returns how often `dispose` was called.
    #[must_use]
    pub fn dispose_count(&self) -> usize {
        self.counters.dispose.load(Ordering::SeqCst)
    }

    /// Returns how often `terminate` was called.
    #[must_use]
    pub fn terminate_count(&self) -> usize {
        self.counters.terminate.load(Ordering::SeqCst)
    }

    /// Hands a message to the registered handler and waits for it.
    ///
    /// # Errors
    ///
    /// Fails when no handler is registered.
    pub async fn deliver(&self, message: Payload) -> Result<(), NanoflowError> {
        let handler = self
            .handler
            .lock()
            .clone()
            .ok_or_else(|| NanoflowError::adapter(self.name(), "no receive handler registered"))?;
        handler(message).await;
        Ok(())
    }
}

impl std::fmt::Debug for MockInputAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockInputAdapter")
            .field("binding", &self.binding)
            .field("has_handler", &self.has_handler())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Disposable for MockInputAdapter {
    async fn dispose(&self) -> Result<(), NanoflowError> {
        self.counters.dispose.fetch_add(1, Ordering::SeqCst);
        self.binding.release_pipeline();
        Ok(())
    }

    async fn terminate(&self) -> Result<(), NanoflowError> {
        self.counters.terminate.fetch_add(1, Ordering::SeqCst);
        self.binding.release_pipeline();
        Ok(())
    }
}

#[async_trait]
impl Adapter for MockInputAdapter {
    fn name(&self) -> &str {
        "mock-input"
    }

    fn attach(&self, config: Arc<dyn Configuration>, pipeline: Weak<dyn PipelineHandle>) {
        self.binding.attach(config, pipeline);
    }

    fn schema(&self) -> serde_json::Value {
        self.binding.schema()
    }

    async fn connect(&self) -> Result<(), NanoflowError> {
        self.counters.connect.fetch_add(1, Ordering::SeqCst);
        if self.fail_connect.load(Ordering::SeqCst) {
            return Err(NanoflowError::adapter(self.name(), "connection refused"));
        }
        Ok(())
    }
}

impl InputAdapter for MockInputAdapter {
    fn receive_message(&self, handler: MessageHandler) {
        *self.handler.lock() = Some(handler);
    }
}

/// An output adapter recording sent messages and, optionally, feedback.
pub struct MockOutputAdapter {
    binding: AdapterBinding,
    self_feedback: bool,
    fail_send: AtomicBool,
    log: Option<CallLog>,
    sent: Mutex<Vec<Payload>>,
    feedback: Mutex<Vec<Payload>>,
    counters: Counters,
}

impl Default for MockOutputAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl MockOutputAdapter {
    /// Creates an output adapter that also acts as feedback sink.
    #[must_use]
    pub fn new() -> Self {
        Self {
            binding: AdapterBinding::new(json!({"kind": "mock-output"})),
            self_feedback: true,
            fail_send: AtomicBool::new(false),
            log: None,
            sent: Mutex::new(Vec::new()),
            feedback: Mutex::new(Vec::new()),
            counters: Counters::default(),
        }
    }

    /// Creates an output adapter without the feedback capability.
    #[must_use]
    pub fn without_feedback() -> Self {
        Self {
            self_feedback: false,
            ..Self::new()
        }
    }

    /// Records `send` and `feedback` entries into `log`.
    #[must_use]
    pub fn with_log(mut self, log: CallLog) -> Self {
        self.log = Some(log);
        self
    }

    /// Makes `send_message` fail.
    pub fn set_fail_send(&self, fail: bool) {
        self.fail_send.store(fail, Ordering::SeqCst);
    }

    /// Returns the binding.
    #[must_use]
    pub fn binding(&self) -> &AdapterBinding {
        &self.binding
    }

    /// Returns every sent message.
    #[must_use]
    pub fn sent(&self) -> Vec<Payload> {
        self.sent.lock().clone()
    }

    /// Returns the number of sent messages.
    #[must_use]
    pub fn sent_count(&self) -> usize {
        self.sent.lock().len()
    }

    /// Returns every message received as feedback.
    #[must_use]
    pub fn feedback(&self) -> Vec<Payload> {
        self.feedback.lock().clone()
    }

    /// Returns the number of feedback calls.
    #[must_use]
    pub fn feedback_count(&self) -> usize {
        self.feedback.lock().len()
    }

    /// Returns how often `connect` was called.
    #[must_use]
    pub fn connect_count(&self) -> usize {
        self.counters.connect.load(Ordering::SeqCst)
    }

    /// Returns how often `dispose` was called.
    #[must_use]
    pub fn dispose_count(&self) -> usize {
        self.counters.dispose.load(Ordering::SeqCst)
    }

    /// Returns how often `terminate` was called.
    #[must_use]
    pub fn terminate_count(&self) -> usize {
        self.counters.terminate.load(Ordering::SeqCst)
    }

    fn record(&self, entry: &str) {
        if let Some(log) = &self.log {
            log.record(entry);
        }
    }
}

impl std::fmt::Debug for MockOutputAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockOutputAdapter")
            .field("binding", &self.binding)
            .field("self_feedback", &self.self_feedback)
            .field("sent", &self.sent_count())
            .field("feedback", &self.feedback_count())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Disposable for MockOutputAdapter {
    async fn dispose(&self) -> Result<(), NanoflowError> {
        self.counters.dispose.fetch_add(1, Ordering::SeqCst);
        self.binding.release_pipeline();
        Ok(())
    }

    async fn terminate(&self) -> Result<(), NanoflowError> {
        self.counters.terminate.fetch_add(1, Ordering::SeqCst);
        self.binding.release_pipeline();
        Ok(())
    }
}

#[async_trait]
impl Adapter for MockOutputAdapter {
    fn name(&self) -> &str {
        "mock-output"
    }

    fn attach(&self, config: Arc<dyn Configuration>, pipeline: Weak<dyn PipelineHandle>) {
        self.binding.attach(config, pipeline);
    }

    fn schema(&self) -> serde_json::Value {
        self.binding.schema()
    }

    async fn connect(&self) -> Result<(), NanoflowError> {
        self.counters.connect.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl OutputAdapter for MockOutputAdapter {
    async fn send_message(&self, message: &Payload) -> Result<(), NanoflowError> {
        self.record("send");
        if self.fail_send.load(Ordering::SeqCst) {
            return Err(NanoflowError::adapter(self.name(), "send failed"));
        }
        self.sent.lock().push(message.clone());
        Ok(())
    }

    fn as_feedback(self: Arc<Self>) -> Option<Arc<dyn FeedbackSink>> {
        if self.self_feedback {
            Some(self)
        } else {
            None
        }
    }
}

#[async_trait]
impl FeedbackSink for MockOutputAdapter {
    async fn handle_feedback(&self, message: &Payload) -> Result<(), NanoflowError> {
        self.record("feedback");
        self.feedback.lock().push(message.clone());
        Ok(())
    }
}

/// A standalone feedback sink that records every message.
#[derive(Debug, Default)]
pub struct RecordingFeedback {
    received: Mutex<Vec<Payload>>,
}

impl RecordingFeedback {
    /// Creates a new recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every received message.
    #[must_use]
    pub fn received(&self) -> Vec<Payload> {
        self.received.lock().clone()
    }

    /// Returns the number of received messages.
    #[must_use]
    pub fn count(&self) -> usize {
        self.received.lock().len()
    }
}

#[async_trait]
impl FeedbackSink for RecordingFeedback {
    async fn handle_feedback(&self, message: &Payload) -> Result<(), NanoflowError> {
        self.received.lock().push(message.clone());
        Ok(())
    }
}
