//! Context management for message execution.
//!
//! This module provides:
//! - A write-once scratch bag shared by the nanos of one execution
//! - The per-message execution context
//! - The request context that accumulates one execution per pipeline hop

mod bags;
#[cfg(test)]
mod context_tests;
mod execution;
mod request;

pub use bags::ContextBag;
pub use execution::{ExecutionContext, OUTPUT_KEY, PIPELINE_NAME_KEY};
pub use request::RequestContext;
