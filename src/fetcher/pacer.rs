//! Self-imposed request pacing.
//!
//! The endpoint has no published rate limit, only abuse detection, so the
//! pacer enforces a minimum gap between outbound requests: a mutex-guarded
//! timestamp of the last request, slept against before each new one. A zero
//! gap disables pacing without changing the call shape.

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};

/// Enforces a minimum gap between consecutive outbound requests.
#[derive(Debug)]
pub struct RequestPacer {
    min_gap: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl RequestPacer {
    /// Create a pacer with the given minimum gap between requests.
    pub fn new(min_gap: Duration) -> Self {
        Self {
            min_gap,
            last_request: Mutex::new(None),
        }
    }

    /// Block until at least `min_gap` has elapsed since the previous
    /// acquire, then record the new request time. The guard is held across
    /// the sleep so concurrent callers serialize rather than stampede.
    pub async fn acquire(&self) {
        if self.min_gap.is_zero() {
            return;
        }

        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_gap {
                sleep(self.min_gap - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}
