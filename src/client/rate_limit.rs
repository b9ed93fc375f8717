//! Reactive rate limiting for the analysis backend
//!
//! Requests go out unthrottled until the backend answers 429. From then on
//! every request waits for the limiter for the rest of the process.

use std::num::NonZeroU32;
use std::sync::atomic::{AtomicBool, Ordering};

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use log::debug;

/// Requests per second once throttling is active
pub const THROTTLED_RATE_PER_SECOND: u32 = 6;

/// Limiter that only engages after the first 429
pub struct ReactiveRateLimiter {
    limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
    active: AtomicBool,
}

impl Default for ReactiveRateLimiter {
    fn default() -> Self {
        Self::new(THROTTLED_RATE_PER_SECOND)
    }
}

impl ReactiveRateLimiter {
    pub fn new(per_second: u32) -> Self {
        let quota = Quota::per_second(NonZeroU32::new(per_second).unwrap_or(NonZeroU32::MIN));
        Self {
            limiter: RateLimiter::direct(quota),
            active: AtomicBool::new(false),
        }
    }

    /// Activate rate limiting (called on 429).
    pub fn activate(&self) {
        let was_active = self.active.swap(true, Ordering::SeqCst);
        if !was_active {
            debug!(
                "Rate limiting activated ({} req/s)",
                THROTTLED_RATE_PER_SECOND
            );
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Wait for permission if rate limiting is active.
    pub async fn wait_if_active(&self) {
        if self.is_active() {
            self.limiter.until_ready().await;
        }
    }
}
