//! Timestamp helpers.
//!
//! Durations inside the runtime are measured with monotonic [`Instant`]s;
//! wall-clock [`Timestamp`]s are only recorded for reporting.

use chrono::{DateTime, Utc};
use std::time::Duration;

/// A wall-clock UTC timestamp.
pub type Timestamp = DateTime<Utc>;

/// Returns the current UTC timestamp.
#[must_use]
pub fn now_utc() -> Timestamp {
    Utc::now()
}

/// Formats a timestamp as ISO 8601 with microsecond precision.
///
/// ```
/// use nanoflow::utils::{iso_timestamp, now_utc};
///
/// let ts = iso_timestamp(&now_utc());
/// assert!(ts.contains('T'));
/// assert!(ts.ends_with("+00:00"));
/// ```
#[must_use]
pub fn iso_timestamp(ts: &Timestamp) -> String {
    ts.format("%Y-%m-%dT%H:%M:%S%.6f+00:00").to_string()
}

/// Converts a duration to fractional milliseconds.
#[must_use]
pub fn duration_ms(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_iso_timestamp_format() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(iso_timestamp(&ts), "2024-01-02T03:04:05.000000+00:00");
    }

    #[test]
    fn test_duration_ms() {
        assert!((duration_ms(Duration::from_micros(1500)) - 1.5).abs() < f64::EPSILON);
        assert!(duration_ms(Duration::ZERO).abs() < f64::EPSILON);
    }
}
