//! Flow-control helpers.

use std::time::Duration;

/// Suspends the current task for the given duration.
///
/// Used for the fixed backoff between service startup attempts.
pub async fn sleep(duration: Duration) {
    if duration.is_zero() {
        tokio::task::yield_now().await;
        return;
    }
    tokio::time::sleep(duration).await;
}

/// Suspends the current task for `ms` milliseconds.
pub async fn sleep_ms(ms: u64) {
    sleep(Duration::from_millis(ms)).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test]
    async fn test_sleep_waits_at_least_duration() {
        let start = Instant::now();
        sleep_ms(5).await;
        assert!(start.elapsed() >= Duration::from_millis(5));
    }

    #[tokio::test]
    async fn test_sleep_zero_returns() {
        sleep(Duration::ZERO).await;
    }
}
