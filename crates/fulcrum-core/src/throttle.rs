//! Fixed-interval request throttling.
//!
//! Every outbound request acquires one permit first. Permits are granted no
//! closer together than the configured interval; there is no burst allowance.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use fulcrum_core::throttle::{Throttle, ThrottleConfig};
//!
//! # async fn run() {
//! let throttle = Throttle::new(ThrottleConfig::new(Duration::from_millis(100)));
//! throttle.acquire().await; // immediate
//! throttle.acquire().await; // ~100ms later
//! # }
//! ```

use std::time::{Duration, Instant};

use tokio::sync::Mutex;

/// Configuration for the request throttle.
#[derive(Debug, Clone)]
pub struct ThrottleConfig {
    /// Minimum time between two consecutive grants.
    pub interval: Duration,
}

impl ThrottleConfig {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Default for ThrottleConfig {
    /// Ten requests per second.
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(100),
        }
    }
}

/// Single-stream gate in front of the HTTP fetcher.
#[derive(Debug)]
pub struct Throttle {
    config: ThrottleConfig,
    /// Time of the previous grant.
    last_grant: Mutex<Option<Instant>>,
}

impl Throttle {
    pub fn new(config: ThrottleConfig) -> Self {
        Self {
            config,
            last_grant: Mutex::new(None),
        }
    }

    /// Wait until the interval has elapsed since the previous grant.
    ///
    /// The lock is held across the sleep, so concurrent callers queue up
    /// behind each other instead of sharing one slot.
    pub async fn acquire(&self) {
        let mut last = self.last_grant.lock().await;

        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.config.interval {
                let wait = self.config.interval - elapsed;
                tracing::debug!(wait_ms = %wait.as_millis(), "Throttling request");
                tokio::time::sleep(wait).await;
            }
        }

        *last = Some(Instant::now());
    }
}

impl Default for Throttle {
    fn default() -> Self {
        Self::new(ThrottleConfig::default())
    }
}
