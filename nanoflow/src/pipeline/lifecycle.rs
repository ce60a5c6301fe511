//! Adapter release tracking for deferred disposal.

use parking_lot::Mutex;
use serde::Serialize;

/// Where a pipeline stands with respect to releasing its adapters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    /// Accepting messages.
    Active,
    /// Disposal requested; waiting for in-flight executions to finish.
    Draining,
    /// Adapters released; every new message is denied.
    Released,
}

#[derive(Debug)]
struct Inner {
    state: LifecycleState,
    in_flight: usize,
}

/// Counts in-flight executions and decides when adapters may be released.
///
/// Adapters are released at the first execution boundary where nothing is in
/// flight, or immediately when disposal is requested on an idle pipeline.
#[derive(Debug)]
pub struct AdapterLifecycle {
    inner: Mutex<Inner>,
}

impl Default for AdapterLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl AdapterLifecycle {
    /// Creates an active lifecycle with nothing in flight.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: LifecycleState::Active,
                in_flight: 0,
            }),
        }
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> LifecycleState {
        self.inner.lock().state
    }

    /// Returns the number of executions currently running.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.inner.lock().in_flight
    }

    /// Admits an execution. Returns false when the message must be denied.
    pub fn enter(&self) -> bool {
        let mut inner = self.inner.lock();
        if inner.state != LifecycleState::Active {
            return false;
        }
        inner.in_flight += 1;
        true
    }

    /// Ends an execution. Returns true when the caller must release adapters.
    pub fn exit(&self) -> bool {
        let mut inner = self.inner.lock();
        inner.in_flight = inner.in_flight.saturating_sub(1);
        if inner.state == LifecycleState::Draining && inner.in_flight == 0 {
            inner.state = LifecycleState::Released;
            return true;
        }
        false
    }

    /// Requests disposal. Returns true when the caller must release adapters now.
    pub fn begin_drain(&self) -> bool {
        let mut inner = self.inner.lock();
        if inner.state != LifecycleState::Active {
            return false;
        }
        if inner.in_flight == 0 {
            inner.state = LifecycleState::Released;
            true
        } else {
            inner.state = LifecycleState::Draining;
            false
        }
    }

    /// Moves straight to `Released` regardless of in-flight executions.
    pub fn force_release(&self) {
        self.inner.lock().state = LifecycleState::Released;
    }
}
