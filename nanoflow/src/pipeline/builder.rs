//! Pipeline construction.

use super::Pipeline;
use crate::adapters::{FeedbackSink, InputAdapter, OutputAdapter};
use crate::config::Configuration;
use crate::events::{get_event_sink, EventSink};
use crate::nanos::Nano;
use std::sync::Arc;

#[derive(Default)]
enum FeedbackChoice {
    #[default]
    FromOutput,
    Explicit(Arc<dyn FeedbackSink>),
    Disabled,
}

/// Builder for [`Pipeline`].
///
/// Unless told otherwise, the output adapter doubles as feedback sink when it
/// implements the feedback contract.
pub struct PipelineBuilder {
    name: String,
    config: Arc<dyn Configuration>,
    nanos: Vec<Arc<dyn Nano>>,
    feedback: FeedbackChoice,
    event_sink: Option<Arc<dyn EventSink>>,
}

impl PipelineBuilder {
    /// Creates a new builder.
    #[must_use]
    pub fn new(name: impl Into<String>, config: Arc<dyn Configuration>) -> Self {
        Self {
            name: name.into(),
            config,
            nanos: Vec::new(),
            feedback: FeedbackChoice::default(),
            event_sink: None,
        }
    }

    /// Appends a nano.
    #[must_use]
    pub fn nano(mut self, nano: Arc<dyn Nano>) -> Self {
        self.nanos.push(nano);
        self
    }

    /// Appends several nanos in order.
    #[must_use]
    pub fn nanos(mut self, nanos: impl IntoIterator<Item = Arc<dyn Nano>>) -> Self {
        self.nanos.extend(nanos);
        self
    }

    /// Uses an explicit feedback sink.
    #[must_use]
    pub fn feedback(mut self, feedback: Arc<dyn FeedbackSink>) -> Self {
        self.feedback = FeedbackChoice::Explicit(feedback);
        self
    }

    /// Builds the pipeline without any feedback sink.
    #[must_use]
    pub fn without_feedback(mut self) -> Self {
        self.feedback = FeedbackChoice::Disabled;
        self
    }

    /// Sets the event sink. Defaults to the process-wide sink.
    #[must_use]
    pub fn event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.event_sink = Some(sink);
        self
    }

    /// Builds the pipeline and attaches both adapters to it.
    pub fn build(self, input: Arc<dyn InputAdapter>, output: Arc<dyn OutputAdapter>) -> Arc<Pipeline> {
        let feedback = match self.feedback {
            FeedbackChoice::FromOutput => output.clone().as_feedback(),
            FeedbackChoice::Explicit(feedback) => Some(feedback),
            FeedbackChoice::Disabled => None,
        };

        Pipeline::assemble(
            self.name,
            self.config,
            self.nanos,
            input,
            output,
            feedback,
            self.event_sink.unwrap_or_else(get_event_sink),
        )
    }
}

impl std::fmt::Debug for PipelineBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineBuilder")
            .field("name", &self.name)
            .field("nanos", &self.nanos)
            .finish_non_exhaustive()
    }
}
