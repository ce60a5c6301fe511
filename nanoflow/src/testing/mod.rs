//! Testing utilities for nanoflow pipelines and services.
//!
//! This module provides:
//! - Mock nanos that record, fail, write or wait
//! - Mock input/output adapters and a recording feedback sink
//! - A mock pipeline and a recording process exit for service tests

mod adapters;
mod fixtures;
mod mocks;

pub use adapters::{MockInputAdapter, MockOutputAdapter, RecordingFeedback};
pub use fixtures::{payload, CallLog, MockPipeline, RecordingExit};
pub use mocks::{FailingNano, RecordingNano, SlowNano, WriteNano};
