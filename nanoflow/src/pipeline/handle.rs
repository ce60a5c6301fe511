//! The contract a service and its adapters use to talk to a pipeline.

use crate::adapters::Disposable;
use crate::errors::NanoflowError;
use crate::messaging::Payload;
use crate::nanos::Nano;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Combined schemas of a pipeline's adapters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineSchema {
    /// The input adapter schema.
    pub input: serde_json::Value,
    /// The output adapter schema.
    pub output: serde_json::Value,
}

/// A pipeline as seen by services and adapters.
#[async_trait]
pub trait PipelineHandle: Disposable {
    /// Returns the pipeline name.
    fn name(&self) -> &str;

    /// Connects both adapters and registers the receive handler.
    ///
    /// Not guarded against repeated calls.
    async fn load(&self) -> Result<(), NanoflowError>;

    /// Appends nanos to the execution list.
    fn add_nanos(&self, nanos: Vec<Arc<dyn Nano>>);

    /// Returns the adapter schemas.
    fn schema(&self) -> PipelineSchema;

    /// Runs one message through every nano. Never fails; failures go to feedback.
    async fn execute(&self, message: &mut Payload);
}
