//! Process exit and signal wiring.

use super::Service;
use crate::errors::NanoflowError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info, warn};

static HANDLERS_INSTALLED: AtomicBool = AtomicBool::new(false);

/// Ends the process once a service has shut down.
pub trait ProcessExit: Send + Sync {
    /// Requests process exit with the given code.
    fn exit(&self, code: i32);
}

/// Exits through [`std::process::exit`].
#[derive(Debug, Clone, Copy, Default)]
pub struct StdProcessExit;

impl ProcessExit for StdProcessExit {
    fn exit(&self, code: i32) {
        std::process::exit(code);
    }
}

impl Service {
    /// Routes SIGTERM to [`Service::terminate`] and makes Ctrl-C exit at once.
    ///
    /// Handlers can be installed only once per process, whichever service
    /// installs them first. Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `ShutdownAlreadyRegistered` on a second installation, or an IO
    /// error if the signal stream cannot be created.
    pub fn install_signal_handlers(self: &Arc<Self>) -> Result<(), NanoflowError> {
        if HANDLERS_INSTALLED.swap(true, Ordering::SeqCst) {
            warn!(service = %self.name(), "Shutdown handlers are already registered for this process");
            return Err(NanoflowError::ShutdownAlreadyRegistered);
        }

        #[cfg(unix)]
        let mut sigterm = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(stream) => stream,
            Err(e) => {
                HANDLERS_INSTALLED.store(false, Ordering::SeqCst);
                return Err(e.into());
            }
        };

        let service = Arc::clone(self);
        tokio::spawn(async move {
            #[cfg(unix)]
            let received = sigterm.recv().await.is_some();
            #[cfg(not(unix))]
            let received = std::future::pending::<bool>().await;

            if received {
                info!(service = %service.name(), "Termination signal detected");
                service.terminate().await;
            }
        });

        let service = Arc::clone(self);
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    warn!(service = %service.name(), "Interrupt received, exiting without graceful shutdown");
                    service.process_exit().exit(0);
                }
                Err(e) => error!(service = %service.name(), error = %e, "Failed to listen for interrupt"),
            }
        });

        info!(service = %self.name(), "Shutdown handlers registered");
        Ok(())
    }
}
