//! Minimum spacing between provider calls

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Rate limiter enforcing a minimum interval between call starts
///
/// The lock is held while sleeping, so concurrent callers queue up and each
/// gets its own slot.
#[derive(Debug)]
pub struct RateLimiter {
    last_request: Mutex<Option<Instant>>,
    min_interval: Duration,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            last_request: Mutex::new(None),
            min_interval,
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Wait if necessary, then record the current instant as a call start
    pub async fn wait(&self) {
        let mut last = self.last_request.lock().await;

        if let Some(last_time) = *last {
            let elapsed = last_time.elapsed();
            if elapsed < self.min_interval {
                let wait_time = self.min_interval - elapsed;
                tracing::debug!(wait_ms = wait_time.as_millis() as u64, "Rate limiting: waiting");
                tokio::time::sleep(wait_time).await;
            }
        }

        *last = Some(Instant::now());
    }
}
