//! Log subscriber setup.

mod subscriber;

pub use subscriber::{build_filter, init_tracing};
