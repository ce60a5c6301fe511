//! Startup tasks run alongside pipeline loading.

use super::Service;
use crate::errors::NanoflowError;
use async_trait::async_trait;

/// Work a service performs on every startup attempt.
#[async_trait]
pub trait StartupTask: Send + Sync {
    /// Returns the task name, used in logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Runs the task. The owning service is passed in for introspection.
    async fn execute(&self, service: &Service) -> Result<(), NanoflowError>;
}
