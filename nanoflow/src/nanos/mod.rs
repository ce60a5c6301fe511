//! The nano trait and small built-in nanos.
//!
//! A nano is one step of a pipeline. It reads and writes the scratch data of
//! the [`ExecutionContext`] and signals failure only through `Err`.

use crate::config::Configuration;
use crate::context::ExecutionContext;
use crate::errors::NanoflowError;
use async_trait::async_trait;
use std::fmt::Debug;

/// A single execution step within a pipeline.
#[async_trait]
pub trait Nano: Send + Sync + Debug {
    /// Returns the name of the nano, used in logs.
    fn name(&self) -> &str;

    /// Executes the nano against one message's context.
    ///
    /// Nanos run strictly one after another within an execution, but the same
    /// nano instance may serve several messages concurrently. Any state kept
    /// outside the context must be protected by the nano itself.
    async fn execute(&self, ctx: &ExecutionContext, config: &dyn Configuration) -> Result<(), NanoflowError>;
}

/// A nano backed by a synchronous closure.
pub struct FnNano<F>
where
    F: Fn(&ExecutionContext) -> Result<(), NanoflowError> + Send + Sync,
{
    name: String,
    func: F,
}

impl<F> FnNano<F>
where
    F: Fn(&ExecutionContext) -> Result<(), NanoflowError> + Send + Sync,
{
    /// Creates a new closure-backed nano.
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> Debug for FnNano<F>
where
    F: Fn(&ExecutionContext) -> Result<(), NanoflowError> + Send + Sync,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnNano").field("name", &self.name).finish()
    }
}

#[async_trait]
impl<F> Nano for FnNano<F>
where
    F: Fn(&ExecutionContext) -> Result<(), NanoflowError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, ctx: &ExecutionContext, _config: &dyn Configuration) -> Result<(), NanoflowError> {
        (self.func)(ctx)
    }
}

/// A nano that does nothing.
#[derive(Debug, Clone)]
pub struct NoOpNano {
    name: String,
}

impl NoOpNano {
    /// Creates a new no-op nano.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl Nano for NoOpNano {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, _ctx: &ExecutionContext, _config: &dyn Configuration) -> Result<(), NanoflowError> {
        Ok(())
    }
}
