use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::time::{sleep, Duration, Instant};
use parking_lot::Mutex;

/// Paces provider requests during universe-wide downloads.
///
/// Yahoo's unauthenticated endpoints throttle bursts, and a cold history
/// cache fans out two dozen fetches at once. Concurrency is capped by a
/// semaphore and request starts keep a minimum gap.
pub struct RateLimiter {
    semaphore: Arc<Semaphore>,
    /// Timestamp of the most recent request start.
    last_request: Arc<Mutex<Instant>>,
    min_delay: Duration,
}

impl RateLimiter {
    pub fn new(max_concurrent: usize, requests_per_minute: u32) -> Self {
        let min_delay_ms = 60_000 / requests_per_minute.max(1) as u64;
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent)),
            last_request: Arc::new(Mutex::new(Instant::now() - Duration::from_secs(60))),
            min_delay: Duration::from_millis(min_delay_ms),
        }
    }

    /// Waits for a concurrency permit, then for the inter-request gap.
    /// The returned guard releases the permit when dropped.
    pub async fn acquire(&self) -> RateLimitGuard {
        let permit = self.semaphore.clone().acquire_owned().await.unwrap();

        let wait_time = {
            let last = self.last_request.lock();
            let elapsed = last.elapsed();
            (elapsed < self.min_delay).then(|| self.min_delay - elapsed)
        }; // Lock is dropped here

        // Sleep outside the lock if needed
        if let Some(delay) = wait_time {
            sleep(delay).await;
        }

        *self.last_request.lock() = Instant::now();

        RateLimitGuard { _permit: permit }
    }
}

/// Holds a concurrency permit; released on drop.
pub struct RateLimitGuard {
    _permit: tokio::sync::OwnedSemaphorePermit,
}
