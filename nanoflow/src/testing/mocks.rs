//! Mock nanos for testing.

use super::CallLog;
use crate::config::Configuration;
use crate::context::{ExecutionContext, OUTPUT_KEY};
use crate::errors::NanoflowError;
use crate::nanos::Nano;
use crate::utils::sleep;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// A nano that records each call into a shared log.
#[derive(Debug)]
pub struct RecordingNano {
    name: String,
    log: CallLog,
    calls: AtomicUsize,
}

impl RecordingNano {
    /// Creates a recording nano with its own log.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_log(name, CallLog::new())
    }

    /// Creates a recording nano writing into `log`.
    #[must_use]
    pub fn with_log(name: impl Into<String>, log: CallLog) -> Self {
        Self {
            name: name.into(),
            log,
            calls: AtomicUsize::new(0),
        }
    }

    /// Returns the number of times the nano ran.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Nano for RecordingNano {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, _ctx: &ExecutionContext, _config: &dyn Configuration) -> Result<(), NanoflowError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.log.record(&self.name);
        Ok(())
    }
}

/// A nano that always fails.
#[derive(Debug)]
pub struct FailingNano {
    name: String,
    error: String,
}

impl FailingNano {
    /// Creates a new failing nano.
    #[must_use]
    pub fn new(name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            error: error.into(),
        }
    }
}

#[async_trait]
impl Nano for FailingNano {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, _ctx: &ExecutionContext, _config: &dyn Configuration) -> Result<(), NanoflowError> {
        Err(NanoflowError::nano(&self.error))
    }
}

/// A nano that writes one scratch value.
#[derive(Debug)]
pub struct WriteNano {
    name: String,
    key: String,
    value: serde_json::Value,
}

impl WriteNano {
    /// Creates a nano writing `value` under `key`.
    #[must_use]
    pub fn new(name: impl Into<String>, key: impl Into<String>, value: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            key: key.into(),
            value,
        }
    }

    /// Creates a nano writing the reserved output key.
    #[must_use]
    pub fn output(name: impl Into<String>, value: serde_json::Value) -> Self {
        Self::new(name, OUTPUT_KEY, value)
    }
}

#[async_trait]
impl Nano for WriteNano {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, ctx: &ExecutionContext, _config: &dyn Configuration) -> Result<(), NanoflowError> {
        ctx.set(self.key.clone(), self.value.clone())?;
        Ok(())
    }
}

/// A nano that takes time to execute.
#[derive(Debug)]
pub struct SlowNano {
    name: String,
    delay: Duration,
}

impl SlowNano {
    /// Creates a new slow nano.
    #[must_use]
    pub fn new(name: impl Into<String>, delay: Duration) -> Self {
        Self {
            name: name.into(),
            delay,
        }
    }

    /// Creates a slow nano with delay in milliseconds.
    #[must_use]
    pub fn with_delay_ms(name: impl Into<String>, ms: u64) -> Self {
        Self::new(name, Duration::from_millis(ms))
    }
}

#[async_trait]
impl Nano for SlowNano {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, _ctx: &ExecutionContext, _config: &dyn Configuration) -> Result<(), NanoflowError> {
        sleep(self.delay).await;
        Ok(())
    }
}
