//! Request spacing shared by every adapter worker.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Roughly thirty years, used when an offset does not fit in an `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// `from + delay`, saturating to a far-future instant instead of panicking.
pub fn instant_after(from: Instant, delay: Duration) -> Instant {
    from.checked_add(delay)
        .or_else(|| from.checked_add(FAR_FUTURE))
        .unwrap_or(from)
}

/// Spaces requests at least `interval` apart across all workers.
///
/// The lock holds the next permitted instant; a caller reserves its slot
/// and releases the lock before sleeping.
#[derive(Debug)]
pub struct RateLimiter {
    interval: Duration,
    next: Mutex<Instant>,
}

impl RateLimiter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next: Mutex::new(Instant::now()),
        }
    }

    /// Reserve the next slot and return the instant it opens.
    pub async fn reserve(&self) -> Instant {
        let mut next = self.next.lock().await;
        let now = Instant::now();
        let slot = if *next > now { *next } else { now };
        *next = instant_after(slot, self.interval);
        slot
    }

    /// Wait for the next slot. Returns `false` if it opens after `deadline`.
    pub async fn acquire(&self, deadline: Instant) -> bool {
        let slot = self.reserve().await;
        if slot > deadline {
            return false;
        }
        tokio::time::sleep_until(slot).await;
        true
    }
}
