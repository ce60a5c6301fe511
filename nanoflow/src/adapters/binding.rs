//! Base lifecycle glue embedded by concrete adapters.

use crate::config::Configuration;
use crate::errors::{AdapterNotInitializedError, BindingPart};
use crate::pipeline::PipelineHandle;
use parking_lot::RwLock;
use std::sync::{Arc, Weak};

/// Holds the schema, configuration and owning pipeline of an adapter.
///
/// The pipeline reference is weak so an adapter never keeps its pipeline
/// alive, and it can be released explicitly once the adapter is disposed.
/// Accessing either reference before [`AdapterBinding::attach`] fails with
/// [`AdapterNotInitializedError`].
pub struct AdapterBinding {
    schema: serde_json::Value,
    pipeline: RwLock<Option<Weak<dyn PipelineHandle>>>,
    config: RwLock<Option<Arc<dyn Configuration>>>,
}

impl AdapterBinding {
    /// Creates an unattached binding with the given schema.
    #[must_use]
    pub fn new(schema: serde_json::Value) -> Self {
        Self {
            schema,
            pipeline: RwLock::new(None),
            config: RwLock::new(None),
        }
    }

    /// Stores the configuration and pipeline references.
    pub fn attach(&self, config: Arc<dyn Configuration>, pipeline: Weak<dyn PipelineHandle>) {
        *self.config.write() = Some(config);
        *self.pipeline.write() = Some(pipeline);
    }

    /// Returns the schema.
    #[must_use]
    pub fn schema(&self) -> serde_json::Value {
        self.schema.clone()
    }

    /// Returns the owning pipeline.
    ///
    /// # Errors
    ///
    /// Fails if the binding was never attached, was released, or the pipeline
    /// has been dropped.
    pub fn pipeline(&self) -> Result<Arc<dyn PipelineHandle>, AdapterNotInitializedError> {
        self.pipeline
            .read()
            .as_ref()
            .and_then(Weak::upgrade)
            .ok_or_else(|| AdapterNotInitializedError::new(BindingPart::Pipeline))
    }

    /// Returns the shared configuration.
    ///
    /// # Errors
    ///
    /// Fails if the binding was never attached.
    pub fn config(&self) -> Result<Arc<dyn Configuration>, AdapterNotInitializedError> {
        self.config
            .read()
            .clone()
            .ok_or_else(|| AdapterNotInitializedError::new(BindingPart::Configuration))
    }

    /// Drops the pipeline reference.
    pub fn release_pipeline(&self) {
        self.pipeline.write().take();
    }

    /// Returns true while a pipeline reference is held.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.pipeline.read().is_some()
    }
}

impl std::fmt::Debug for AdapterBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterBinding")
            .field("schema", &self.schema)
            .field("attached", &self.is_attached())
            .field("configured", &self.config.read().is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InMemoryConfiguration;
    use crate::testing::MockPipeline;
    use serde_json::json;

    #[test]
    fn test_unattached_binding_fails_fast() {
        let binding = AdapterBinding::new(json!({"queue": "in"}));

        let err = binding.pipeline().err().unwrap();
        assert_eq!(err.to_string(), "Pipeline interface has not been initialized");

        let err = binding.config().err().unwrap();
        assert_eq!(err.to_string(), "Configuration interface has not been initialized");

        assert_eq!(binding.schema(), json!({"queue": "in"}));
    }

    #[test]
    fn test_attach_and_release() {
        let binding = AdapterBinding::new(json!({}));
        let pipeline: Arc<dyn PipelineHandle> = Arc::new(MockPipeline::new("orders"));
        let config: Arc<dyn Configuration> = Arc::new(InMemoryConfiguration::new());

        binding.attach(config, Arc::downgrade(&pipeline));
        assert!(binding.is_attached());
        assert_eq!(binding.pipeline().unwrap().name(), "orders");
        assert!(binding.config().is_ok());

        binding.release_pipeline();
        assert!(!binding.is_attached());
        assert!(binding.pipeline().is_err());
        assert!(binding.config().is_ok());
    }

    #[test]
    fn test_dropped_pipeline_is_not_initialized() {
        let binding = AdapterBinding::new(json!({}));
        let pipeline: Arc<dyn PipelineHandle> = Arc::new(MockPipeline::new("orders"));
        binding.attach(Arc::new(InMemoryConfiguration::new()), Arc::downgrade(&pipeline));
        drop(pipeline);

        assert!(binding.pipeline().is_err());
    }
}
