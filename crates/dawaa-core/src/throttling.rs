use std::num::NonZeroU32;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use governor::clock::{Clock, DefaultClock};
use governor::state::direct::NotKeyed;
use governor::state::InMemoryState;
use governor::{Quota, RateLimiter};

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Fixed delay between consecutive outbound calls in batch flows.
pub const BATCH_DELAY_MS: u64 = 200;

/// Per-source rate limiter for live adapters.
///
/// The quota is spread across the window (window / limit per cell, full
/// burst allowed) so a batch does not fire its whole budget in the first
/// second. A denied acquire records how long the limiter asked us to wait;
/// the router skips the source instead of sleeping, so the chain keeps
/// moving while the budget refills.
#[derive(Clone)]
pub struct SourceThrottle {
    limiter: Arc<DirectRateLimiter>,
    clock: DefaultClock,
    denied_until: Arc<Mutex<Option<Instant>>>,
}

impl SourceThrottle {
    pub fn new(quota_window: Duration, quota_limit: u32) -> Self {
        let safe_limit = quota_limit.max(1);
        let burst = NonZeroU32::new(safe_limit).expect("safe limit must be non-zero");
        let seconds_per_cell = (quota_window.as_secs_f64() / f64::from(safe_limit)).max(0.001);
        let quota = Quota::with_period(Duration::from_secs_f64(seconds_per_cell))
            .expect("period is always greater than zero")
            .allow_burst(burst);

        Self {
            limiter: Arc::new(RateLimiter::direct(quota)),
            clock: DefaultClock::default(),
            denied_until: Arc::new(Mutex::new(None)),
        }
    }

    /// Convenience quota of `limit` requests per minute.
    pub fn per_minute(limit: u32) -> Self {
        Self::new(Duration::from_secs(60), limit)
    }

    /// Consume one cell of quota, or report how long until one frees up.
    pub fn try_acquire(&self) -> Result<(), Duration> {
        match self.limiter.check() {
            Ok(()) => {
                let mut denied = self
                    .denied_until
                    .lock()
                    .expect("throttle denial marker is not poisoned");
                *denied = None;
                Ok(())
            }
            Err(not_until) => {
                let wait = not_until.wait_time_from(self.clock.now());
                let mut denied = self
                    .denied_until
                    .lock()
                    .expect("throttle denial marker is not poisoned");
                *denied = Some(Instant::now() + wait);
                Err(wait)
            }
        }
    }

    /// Non-consuming availability estimate from the most recent denial.
    /// Fresh throttles and throttles whose last denial has aged out report
    /// available.
    pub fn available(&self) -> bool {
        let denied = self
            .denied_until
            .lock()
            .expect("throttle denial marker is not poisoned");
        match *denied {
            Some(until) => Instant::now() >= until,
            None => true,
        }
    }
}

/// Spaces consecutive requests in batch flows by a fixed delay.
///
/// The price refresh walks many medicines against one upstream; the pacer
/// keeps that walk polite without involving the per-source quota.
pub struct BatchPacer {
    delay: Duration,
    last: tokio::sync::Mutex<Option<tokio::time::Instant>>,
}

impl Default for BatchPacer {
    fn default() -> Self {
        Self::new(Duration::from_millis(BATCH_DELAY_MS))
    }
}

impl BatchPacer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            last: tokio::sync::Mutex::new(None),
        }
    }

    /// Sleep whatever remains of the inter-request delay. The first call
    /// never sleeps.
    pub async fn pace(&self) {
        let mut last = self.last.lock().await;
        if let Some(previous) = *last {
            let due = previous + self.delay;
            let now = tokio::time::Instant::now();
            if due > now {
                tokio::time::sleep(due - now).await;
            }
        }
        *last = Some(tokio::time::Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn denies_once_quota_is_spent() {
        let throttle = SourceThrottle::new(Duration::from_secs(60), 2);

        assert!(throttle.available());
        assert!(throttle.try_acquire().is_ok());
        assert!(throttle.try_acquire().is_ok());

        let wait = throttle.try_acquire().expect_err("quota spent");
        assert!(wait > Duration::ZERO);
        assert!(!throttle.available());
    }

    #[test]
    fn zero_limit_is_clamped_to_one() {
        let throttle = SourceThrottle::new(Duration::from_secs(1), 0);
        assert!(throttle.try_acquire().is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn paces_consecutive_batch_requests() {
        let pacer = BatchPacer::default();
        let start = tokio::time::Instant::now();

        pacer.pace().await;
        pacer.pace().await;
        pacer.pace().await;

        assert!(start.elapsed() >= Duration::from_millis(2 * BATCH_DELAY_MS));
    }
}
