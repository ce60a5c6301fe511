//! Small helpers shared across the runtime: ids, timestamps and flow control.

pub mod flow;
pub mod timestamps;

pub use flow::sleep;
pub use timestamps::{duration_ms, iso_timestamp, now_utc, Timestamp};

use uuid::Uuid;

/// Generates a new random identifier.
#[must_use]
pub fn generate_uuid() -> Uuid {
    Uuid::new_v4()
}

/// Generates a new time-ordered identifier.
#[must_use]
pub fn generate_uuid_v7() -> Uuid {
    Uuid::now_v7()
}
