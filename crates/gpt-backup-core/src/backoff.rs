//! Bounded retry with exponential delay.
//!
//! The wait after a failed attempt is `initial * multiplier^attempt`, where
//! `attempt` is the 1-based index of the attempt that just failed. The first
//! retry therefore already waits `initial * multiplier` (20s with the
//! defaults), then 40s, 80s and so on. Wrapping tools time their output
//! against this schedule, so keep the exponent as is.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::warn;

use crate::error::{HarvestError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    /// Total attempts, including the first one. Zero is treated as one.
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub multiplier: u32,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(10_000),
            multiplier: 2,
        }
    }
}

impl BackoffPolicy {
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Delay before retrying once `attempt` (1-based) has failed.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = self.multiplier.checked_pow(attempt).unwrap_or(u32::MAX);
        self.initial_backoff.saturating_mul(factor)
    }
}

/// Run `operation` until it succeeds or `policy.max_attempts` attempts have
/// failed, sleeping between attempts. The last failure is reported as
/// [`HarvestError::FetchExhausted`].
pub async fn fetch_with_backoff<T, E, F, Fut>(
    policy: &BackoffPolicy,
    label: &str,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<T, E>>,
    E: Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt >= max_attempts => {
                warn!("{}: giving up after {} attempts: {}", label, attempt, e);
                return Err(HarvestError::FetchExhausted {
                    attempts: attempt,
                    last_error: e.to_string(),
                });
            }
            Err(e) => {
                let wait = policy.delay_after(attempt);
                warn!(
                    "{}: attempt {}/{} failed ({}), retrying in {}ms",
                    label,
                    attempt,
                    max_attempts,
                    e,
                    wait.as_millis()
                );
                sleep(wait).await;
                attempt += 1;
            }
        }
    }
}
