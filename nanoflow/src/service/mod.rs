//! Service supervision.
//!
//! A service owns pipelines and startup tasks. It loads them as one batch with
//! bounded whole-batch retry, and on termination shuts every pipeline down
//! before asking the process to exit.

mod shutdown;
mod supervisor;
mod task;


pub use shutdown::{ProcessExit, StdProcessExit};
pub use supervisor::Service;
pub use task::StartupTask;

use serde::Serialize;

/// Lifecycle state of a [`Service`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceState {
    /// Created, never started.
    Constructed,
    /// A startup attempt is in progress or waiting to retry.
    Starting,
    /// Every startup task and pipeline load succeeded.
    Running,
    /// The retry budget ran out; the service is not running.
    StartupFailed,
    /// Pipelines are being terminated.
    Terminating,
    /// Termination finished and process exit was requested.
    Terminated,
}

impl std::fmt::Display for ServiceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Constructed => "constructed",
            Self::Starting => "starting",
            Self::Running => "running",
            Self::StartupFailed => "startup_failed",
            Self::Terminating => "terminating",
            Self::Terminated => "terminated",
        };
        f.write_str(s)
    }
}
