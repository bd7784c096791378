//! Request pacing
//!
//! Uses the governor crate with a burst of one, so two permits are always at
//! least one period apart. Each agent owns its own pacer.

use governor::clock::MonotonicClock;
use governor::middleware::NoOpMiddleware;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter as Governor};
use std::sync::Arc;
use std::time::{Duration, Instant};

type DirectLimiter = Governor<NotKeyed, InMemoryState, MonotonicClock, NoOpMiddleware<Instant>>;

/// Enforces a minimum spacing between consecutive requests
#[derive(Clone)]
pub struct Pacer {
    limiter: Option<Arc<DirectLimiter>>,
    interval: Duration,
}

impl Pacer {
    /// Create a pacer; a zero interval disables pacing
    pub fn new(interval: Duration) -> Self {
        let limiter = Quota::with_period(interval)
            .map(|quota| Arc::new(Governor::direct_with_clock(quota, &MonotonicClock)));

        Self { limiter, interval }
    }

    /// Create a pacer that never waits
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    /// Configured minimum spacing
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Whether this pacer ever waits
    pub fn is_enabled(&self) -> bool {
        self.limiter.is_some()
    }

    /// Wait until the next request may be sent
    pub async fn wait(&self) {
        if let Some(ref limiter) = self.limiter {
            limiter.until_ready().await;
        }
    }

    /// Try to take the next slot without waiting
    pub fn try_acquire(&self) -> bool {
        match self.limiter {
            Some(ref limiter) => limiter.check().is_ok(),
            None => true,
        }
    }
}

impl Default for Pacer {
    fn default() -> Self {
        Self::disabled()
    }
}

impl std::fmt::Debug for Pacer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pacer")
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}
