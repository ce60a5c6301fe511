//! # Nanoflow
//!
//! A pipeline execution and service lifecycle engine for microservices built
//! from small processing units called nanos.
//!
//! Nanoflow provides:
//!
//! - **Execution contexts**: write-once per-message scratch data with timing
//! - **Pipelines**: ordered nanos between one input and one output adapter,
//!   with failures routed to feedback instead of crashing the receive loop
//! - **Adapter lifecycle**: attach, deferred disposal and termination
//! - **Service supervision**: whole-batch startup retry and graceful shutdown
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use nanoflow::prelude::*;
//!
//! let config: Arc<dyn Configuration> = Arc::new(InMemoryConfiguration::new());
//! let pipeline = Pipeline::builder("greeter", config.clone())
//!     .nano(Arc::new(GreetNano))
//!     .build(input, output);
//!
//! let service = Arc::new(Service::new(ServiceSettings::from_env("greeter")?, config, vec![]));
//! service.add_pipelines([pipeline as Arc<dyn PipelineHandle>]);
//! service.run().await?;
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod adapters;
pub mod config;
pub mod context;
pub mod errors;
pub mod events;
pub mod messaging;
pub mod nanos;
pub mod observability;
pub mod pipeline;
pub mod service;
pub mod testing;
pub mod utils;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::adapters::{
        Adapter, AdapterBinding, Disposable, FeedbackSink, InputAdapter, MessageHandler,
        OutputAdapter,
    };
    pub use crate::config::{
        Configuration, ConfigurationExt, InMemoryConfiguration, LoggingConfig, ServiceSettings,
        StartupPolicy,
    };
    pub use crate::context::{
        ContextBag, ExecutionContext, RequestContext, OUTPUT_KEY, PIPELINE_NAME_KEY,
    };
    pub use crate::errors::{
        ConfigurationError, DuplicateKeyError, NanoExecutionError, NanoflowError, StartupError,
    };
    pub use crate::events::{EventSink, LoggingEventSink, NoOpEventSink};
    pub use crate::messaging::Payload;
    pub use crate::nanos::{FnNano, Nano, NoOpNano};
    pub use crate::observability::init_tracing;
    pub use crate::pipeline::{Pipeline, PipelineBuilder, PipelineHandle, PipelineSchema};
    pub use crate::service::{ProcessExit, Service, ServiceState, StartupTask};
    pub use crate::utils::{generate_uuid, iso_timestamp, Timestamp};
    pub use std::sync::Arc;
}
