//! Message model passed between adapters and pipelines.

mod payload;

pub use payload::Payload;
