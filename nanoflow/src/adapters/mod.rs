//! Adapter capabilities and the shared binding glue.
//!
//! Adapters move messages in and out of a pipeline. The engine never knows the
//! transport behind them; it only drives the contracts defined here.

mod binding;

pub use binding::AdapterBinding;

use crate::config::Configuration;
use crate::errors::NanoflowError;
use crate::messaging::Payload;
use crate::pipeline::PipelineHandle;
use async_trait::async_trait;
use futures::future::BoxFuture;
use std::sync::{Arc, Weak};

/// The receive callback an input adapter invokes for every inbound message.
pub type MessageHandler = Arc<dyn Fn(Payload) -> BoxFuture<'static, ()> + Send + Sync>;

/// A component holding resources that must be released on shutdown.
#[async_trait]
pub trait Disposable: Send + Sync {
    /// Releases resources gracefully.
    async fn dispose(&self) -> Result<(), NanoflowError>;

    /// Releases resources immediately. Defaults to [`Disposable::dispose`].
    async fn terminate(&self) -> Result<(), NanoflowError> {
        self.dispose().await
    }
}

/// Behaviour shared by input and output adapters.
#[async_trait]
pub trait Adapter: Disposable {
    /// Returns the adapter name, used in logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Binds the adapter to its configuration and owning pipeline.
    fn attach(&self, config: Arc<dyn Configuration>, pipeline: Weak<dyn PipelineHandle>);

    /// Returns the adapter schema for introspection.
    fn schema(&self) -> serde_json::Value;

    /// Opens the underlying transport.
    async fn connect(&self) -> Result<(), NanoflowError>;
}

/// An adapter that delivers inbound messages.
pub trait InputAdapter: Adapter {
    /// Registers the handler invoked for every inbound message.
    fn receive_message(&self, handler: MessageHandler);
}

/// An adapter that emits outbound messages.
#[async_trait]
pub trait OutputAdapter: Adapter {
    /// Sends a message downstream.
    async fn send_message(&self, message: &Payload) -> Result<(), NanoflowError>;

    /// Returns this adapter as a feedback sink when it also reports feedback.
    fn as_feedback(self: Arc<Self>) -> Option<Arc<dyn FeedbackSink>> {
        None
    }
}

/// Receives every message once a pipeline is done with it.
#[async_trait]
pub trait FeedbackSink: Send + Sync {
    /// Handles the final (or original, on failure) message.
    async fn handle_feedback(&self, message: &Payload) -> Result<(), NanoflowError>;
}
