//! Pipeline construction and execution.
//!
//! This module provides:
//! - The [`Pipeline`] that drives one message through its nanos
//! - The [`PipelineHandle`] contract used by services and adapters
//! - Deferred adapter release through [`AdapterLifecycle`]

mod builder;
mod executor;
mod handle;
mod lifecycle;

#[cfg(test)]
mod integration_tests;

pub use builder::PipelineBuilder;
pub use executor::Pipeline;
pub use handle::{PipelineHandle, PipelineSchema};
pub use lifecycle::{AdapterLifecycle, LifecycleState};
