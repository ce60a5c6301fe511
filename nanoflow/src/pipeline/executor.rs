//! The pipeline: ordered nanos between one input and one output adapter.

use super::{AdapterLifecycle, LifecycleState, PipelineBuilder, PipelineHandle, PipelineSchema};
use crate::adapters::{Disposable, FeedbackSink, InputAdapter, MessageHandler, OutputAdapter};
use crate::config::Configuration;
use crate::context::{ExecutionContext, OUTPUT_KEY, PIPELINE_NAME_KEY};
use crate::errors::{FeedbackNotConfiguredError, NanoExecutionError, NanoflowError};
use crate::events::{names, EventSink};
use crate::messaging::Payload;
use crate::nanos::Nano;
use crate::utils::{duration_ms, generate_uuid_v7};
use async_trait::async_trait;
use futures::FutureExt;
use parking_lot::RwLock;
use serde_json::json;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tracing::{debug, error, info, warn, Instrument};

/// Drives messages from an input adapter through nanos to an output adapter.
///
/// Failures never escape [`PipelineHandle::execute`]: they are logged and the
/// original message is routed to the feedback sink instead of being sent.
pub struct Pipeline {
    name: String,
    config: Arc<dyn Configuration>,
    nanos: RwLock<Vec<Arc<dyn Nano>>>,
    input: Arc<dyn InputAdapter>,
    output: Arc<dyn OutputAdapter>,
    feedback: Option<Arc<dyn FeedbackSink>>,
    lifecycle: AdapterLifecycle,
    event_sink: Arc<dyn EventSink>,
    this: Weak<Pipeline>,
}

impl Pipeline {
    /// Creates a pipeline using the output adapter as feedback sink when it
    /// supports feedback.
    pub fn new(
        name: impl Into<String>,
        config: Arc<dyn Configuration>,
        input: Arc<dyn InputAdapter>,
        output: Arc<dyn OutputAdapter>,
    ) -> Arc<Self> {
        PipelineBuilder::new(name, config).build(input, output)
    }

    /// Creates a builder.
    pub fn builder(name: impl Into<String>, config: Arc<dyn Configuration>) -> PipelineBuilder {
        PipelineBuilder::new(name, config)
    }

    pub(super) fn assemble(
        name: String,
        config: Arc<dyn Configuration>,
        nanos: Vec<Arc<dyn Nano>>,
        input: Arc<dyn InputAdapter>,
        output: Arc<dyn OutputAdapter>,
        feedback: Option<Arc<dyn FeedbackSink>>,
        event_sink: Arc<dyn EventSink>,
    ) -> Arc<Self> {
        Arc::new_cyclic(|this: &Weak<Self>| {
            let handle: Weak<dyn PipelineHandle> = this.clone();
            input.attach(config.clone(), handle.clone());
            output.attach(config.clone(), handle);

            Self {
                name,
                config,
                nanos: RwLock::new(nanos),
                input,
                output,
                feedback,
                lifecycle: AdapterLifecycle::new(),
                event_sink,
                this: this.clone(),
            }
        })
    }

    /// Returns the number of nanos.
    #[must_use]
    pub fn nano_count(&self) -> usize {
        self.nanos.read().len()
    }

    /// Returns the nano names in execution order.
    #[must_use]
    pub fn nano_names(&self) -> Vec<String> {
        self.nanos.read().iter().map(|n| n.name().to_string()).collect()
    }

    /// Returns true when a feedback sink is wired.
    #[must_use]
    pub fn has_feedback(&self) -> bool {
        self.feedback.is_some()
    }

    /// Returns the adapter lifecycle state.
    #[must_use]
    pub fn lifecycle_state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    /// Hands a message to the feedback sink.
    ///
    /// # Errors
    ///
    /// Returns `FeedbackNotConfigured` when the pipeline has no feedback sink,
    /// or whatever the sink itself reports.
    pub async fn send_feedback(&self, message: &Payload) -> Result<(), NanoflowError> {
        match &self.feedback {
            Some(feedback) => feedback.handle_feedback(message).await,
            None => Err(FeedbackNotConfiguredError::new(&self.name).into()),
        }
    }

    async fn run(&self, message: &mut Payload) {
        match self.process(message).await {
            Ok(elapsed) => {
                debug!(pipeline = %self.name, duration_ms = duration_ms(elapsed), "Message processed");
                self.event_sink.try_emit(
                    names::PIPELINE_EXECUTION_COMPLETED,
                    Some(json!({
                        "pipeline": self.name,
                        "origin": message.origin(),
                        "durationMs": duration_ms(elapsed),
                    })),
                );
            }
            Err(cause) => {
                let err = NanoflowError::from(NanoExecutionError::new(&self.name, cause));
                error!(pipeline = %self.name, origin = %message.origin(), error = %err, "Pipeline execution failed");
                self.event_sink.try_emit(
                    names::PIPELINE_EXECUTION_FAILED,
                    Some(json!({
                        "pipeline": self.name,
                        "origin": message.origin(),
                        "error": err.to_dict(),
                    })),
                );
            }
        }

        if let Err(e) = self.send_feedback(message).await {
            error!(pipeline = %self.name, error = %e, "Feedback delivery failed");
        }
    }

    async fn process(&self, message: &mut Payload) -> Result<Duration, NanoflowError> {
        let nanos = self.nanos.read().clone();

        let ctx = ExecutionContext::new(message.origin(), &message.context).with_id(generate_uuid_v7().to_string());
        ctx.set(PIPELINE_NAME_KEY, json!(self.name))?;

        for nano in &nanos {
            debug!(pipeline = %self.name, nano = nano.name(), "Executing nano");
            nano.execute(&ctx, self.config.as_ref()).await?;
        }

        let original = ctx
            .get(OUTPUT_KEY)
            .map(|output| std::mem::replace(&mut message.data, output));

        ctx.complete();
        let elapsed = ctx.duration();
        message.context.push_execution_context(ctx);

        if let Err(e) = self.output.send_message(message).await {
            if let Some(original) = original {
                message.data = original;
            }
            return Err(e);
        }

        Ok(elapsed)
    }

    async fn release_adapters(&self) {
        info!(pipeline = %self.name, "Releasing adapters");
        let (input, output) = futures::join!(self.input.dispose(), self.output.dispose());

        if let Err(e) = input {
            warn!(pipeline = %self.name, adapter = self.input.name(), error = %e, "Input adapter dispose failed");
        }
        if let Err(e) = output {
            warn!(pipeline = %self.name, adapter = self.output.name(), error = %e, "Output adapter dispose failed");
        }

        self.event_sink
            .try_emit(names::PIPELINE_RELEASED, Some(json!({"pipeline": self.name})));
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("name", &self.name)
            .field("nanos", &self.nano_names())
            .field("input", &self.input.name())
            .field("output", &self.output.name())
            .field("has_feedback", &self.has_feedback())
            .field("lifecycle", &self.lifecycle)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl PipelineHandle for Pipeline {
    fn name(&self) -> &str {
        &self.name
    }

    async fn load(&self) -> Result<(), NanoflowError> {
        self.input.connect().await?;
        self.output.connect().await?;

        let pipeline = self.this.clone();
        let handler: MessageHandler = Arc::new(move |mut message: Payload| {
            let pipeline = pipeline.clone();
            async move {
                if let Some(pipeline) = pipeline.upgrade() {
                    pipeline.execute(&mut message).await;
                }
            }
            .boxed()
        });
        self.input.receive_message(handler);

        info!(pipeline = %self.name, "Pipeline loaded");
        Ok(())
    }

    fn add_nanos(&self, nanos: Vec<Arc<dyn Nano>>) {
        self.nanos.write().extend(nanos);
    }

    fn schema(&self) -> PipelineSchema {
        PipelineSchema {
            input: self.input.schema(),
            output: self.output.schema(),
        }
    }

    async fn execute(&self, message: &mut Payload) {
        if !self.lifecycle.enter() {
            warn!(pipeline = %self.name, origin = %message.origin(), "Pipeline disposed, message denied");
            self.event_sink.try_emit(
                names::PIPELINE_EXECUTION_DENIED,
                Some(json!({"pipeline": self.name, "origin": message.origin()})),
            );
            return;
        }

        let span = tracing::info_span!("pipeline.execute", pipeline = %self.name, origin = %message.origin());
        self.run(message).instrument(span).await;

        if self.lifecycle.exit() {
            self.release_adapters().await;
        }
    }
}

#[async_trait]
impl Disposable for Pipeline {
    async fn dispose(&self) -> Result<(), NanoflowError> {
        if self.lifecycle.begin_drain() {
            self.release_adapters().await;
        } else {
            debug!(pipeline = %self.name, in_flight = self.lifecycle.in_flight(), "Adapter release deferred");
        }
        Ok(())
    }

    async fn terminate(&self) -> Result<(), NanoflowError> {
        info!(pipeline = %self.name, "Terminating pipeline");
        self.lifecycle.force_release();

        let (input, output) = futures::join!(self.input.terminate(), self.output.terminate());
        input.and(output)
    }
}
