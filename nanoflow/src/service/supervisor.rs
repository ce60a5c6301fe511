//! The service supervisor.

use super::{ProcessExit, ServiceState, StartupTask, StdProcessExit};
use crate::config::{Configuration, ServiceSettings};
use crate::errors::{NanoflowError, StartupError};
use crate::events::{get_event_sink, names, EventSink};
use crate::pipeline::PipelineHandle;
use crate::utils::sleep;
use futures::future::join_all;
use parking_lot::RwLock;
use serde_json::json;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Owns the pipelines and startup tasks of one microservice.
pub struct Service {
    settings: ServiceSettings,
    config: Arc<dyn Configuration>,
    pipelines: RwLock<Vec<Arc<dyn PipelineHandle>>>,
    tasks: Vec<Arc<dyn StartupTask>>,
    startup_attempts: AtomicU32,
    state: RwLock<ServiceState>,
    event_sink: Arc<dyn EventSink>,
    exit: Arc<dyn ProcessExit>,
}

impl Service {
    /// Creates a service. The startup tasks are fixed from here on.
    pub fn new(
        settings: ServiceSettings,
        config: Arc<dyn Configuration>,
        tasks: Vec<Arc<dyn StartupTask>>,
    ) -> Self {
        Self {
            settings,
            config,
            pipelines: RwLock::new(Vec::new()),
            tasks,
            startup_attempts: AtomicU32::new(0),
            state: RwLock::new(ServiceState::Constructed),
            event_sink: get_event_sink(),
            exit: Arc::new(StdProcessExit),
        }
    }

    /// Sets the event sink.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.event_sink = sink;
        self
    }

    /// Replaces the process exit collaborator.
    #[must_use]
    pub fn with_process_exit(mut self, exit: Arc<dyn ProcessExit>) -> Self {
        self.exit = exit;
        self
    }

    /// Returns the service name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.settings.service_name
    }

    /// Returns the settings.
    #[must_use]
    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }

    /// Returns the shared configuration.
    #[must_use]
    pub fn config(&self) -> &Arc<dyn Configuration> {
        &self.config
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> ServiceState {
        *self.state.read()
    }

    /// Returns the number of failed startup attempts so far.
    #[must_use]
    pub fn startup_attempts(&self) -> u32 {
        self.startup_attempts.load(Ordering::SeqCst)
    }

    /// Returns the owned pipelines.
    #[must_use]
    pub fn pipelines(&self) -> Vec<Arc<dyn PipelineHandle>> {
        self.pipelines.read().clone()
    }

    /// Appends pipelines.
    pub fn add_pipelines(&self, pipelines: impl IntoIterator<Item = Arc<dyn PipelineHandle>>) {
        self.pipelines.write().extend(pipelines);
    }

    pub(super) fn process_exit(&self) -> &Arc<dyn ProcessExit> {
        &self.exit
    }

    /// Starts the service with the retry policy from its settings.
    pub async fn start_default(&self) -> ServiceState {
        let policy = self.settings.startup;
        self.start(policy.retry_attempts, policy.retry_interval()).await
    }

    /// Starts the service.
    ///
    /// Every attempt fetches the configuration, then runs all startup tasks
    /// and loads all pipelines concurrently. If any of them fails the whole
    /// batch is retried after `retry_interval`, up to `retry_attempts` times.
    /// Exhausting the budget is reported through logs and events; the call
    /// itself still returns normally with [`ServiceState::StartupFailed`].
    pub async fn start(&self, retry_attempts: u32, retry_interval: Duration) -> ServiceState {
        loop {
            self.set_state(ServiceState::Starting);
            info!(service = %self.name(), "Starting {}", self.name());
            self.event_sink.try_emit(
                names::SERVICE_STARTING,
                Some(json!({"service": self.name(), "attempt": self.startup_attempts() + 1})),
            );

            let Err(err) = self.start_once().await else {
                self.set_state(ServiceState::Running);
                info!(service = %self.name(), pipelines = self.pipelines.read().len(), "Service running");
                self.event_sink
                    .try_emit(names::SERVICE_RUNNING, Some(json!({"service": self.name()})));
                return ServiceState::Running;
            };

            let attempts = self.startup_attempts.fetch_add(1, Ordering::SeqCst) + 1;
            if attempts <= retry_attempts {
                warn!(
                    service = %self.name(),
                    attempt = attempts,
                    retry_attempts,
                    error = %err,
                    "Start attempt {attempts} of {retry_attempts} failed. Attempting to restart..."
                );
                self.event_sink.try_emit(
                    names::SERVICE_START_ATTEMPT_FAILED,
                    Some(json!({
                        "service": self.name(),
                        "attempt": attempts,
                        "retryAttempts": retry_attempts,
                        "error": err.to_dict(),
                    })),
                );
                sleep(retry_interval).await;
            } else {
                error!(service = %self.name(), attempts, error = %err, "Service startup retries exhausted");
                self.event_sink.try_emit(
                    names::SERVICE_STARTUP_EXHAUSTED,
                    Some(json!({
                        "service": self.name(),
                        "attempts": attempts,
                        "error": err.to_dict(),
                    })),
                );
                self.set_state(ServiceState::StartupFailed);
                return ServiceState::StartupFailed;
            }
        }
    }

    async fn start_once(&self) -> Result<(), NanoflowError> {
        self.config.fetch().await?;

        let pipelines = self.pipelines();
        let tasks = join_all(self.tasks.iter().map(|task| async move {
            task.execute(self).await.map_err(|e| {
                NanoflowError::from(StartupError::new(self.name(), e.to_string()))
            })
        }));
        let loads = join_all(pipelines.iter().map(|pipeline| pipeline.load()));

        let (task_results, load_results) = futures::join!(tasks, loads);
        task_results.into_iter().chain(load_results).collect()
    }

    /// Terminates every pipeline, then requests process exit.
    ///
    /// Pipeline failures are logged and never prevent the exit.
    pub async fn terminate(&self) {
        info!(service = %self.name(), "Termination signal detected for service");
        self.set_state(ServiceState::Terminating);
        self.event_sink
            .try_emit(names::SERVICE_TERMINATING, Some(json!({"service": self.name()})));

        let pipelines = self.pipelines();
        let results = join_all(pipelines.iter().map(|pipeline| pipeline.terminate())).await;

        let mut failures = 0_usize;
        for (pipeline, result) in pipelines.iter().zip(results) {
            if let Err(e) = result {
                failures += 1;
                error!(service = %self.name(), pipeline = pipeline.name(), error = %e, "Pipeline termination failed");
            }
        }

        self.set_state(ServiceState::Terminated);
        self.event_sink.try_emit(
            names::SERVICE_TERMINATED,
            Some(json!({"service": self.name(), "failures": failures})),
        );
        self.exit.exit(0);
    }

    /// Installs the signal handlers and starts with the configured policy.
    ///
    /// # Errors
    ///
    /// Fails only if the signal handlers cannot be installed.
    pub async fn run(self: &Arc<Self>) -> Result<ServiceState, NanoflowError> {
        self.install_signal_handlers()?;
        Ok(self.start_default().await)
    }

    fn set_state(&self, state: ServiceState) {
        *self.state.write() = state;
    }
}

impl std::fmt::Debug for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Service")
            .field("name", &self.name())
            .field("state", &self.state())
            .field("pipelines", &self.pipelines.read().len())
            .field("tasks", &self.tasks.len())
            .field("startup_attempts", &self.startup_attempts())
            .finish_non_exhaustive()
    }
}
