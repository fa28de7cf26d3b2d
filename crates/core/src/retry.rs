//! Retry classification and bounded backoff for remote calls.
//!
//! Each call to [`RetryPolicy::run`] owns its own attempt counter, so retries
//! on one chunk never eat into the budget of the next one.

use std::future::Future;
use std::time::Duration;

use log::{debug, warn};

use crate::errors::Result;

/// Default number of attempts per remote call (first try included).
const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default delay before the first retry.
const DEFAULT_BASE_DELAY_MS: u64 = 500;

/// Upper bound for a single backoff delay.
const DEFAULT_MAX_DELAY_MS: u64 = 8_000;

/// Classification for retry policy.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RetryClass {
    /// Never retry - the call would fail the same way again.
    Never,
    /// Retry with exponential backoff until attempts run out.
    WithBackoff,
}

/// Bounded exponential backoff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one. Zero behaves like one.
    pub max_attempts: u32,
    /// Delay before the second attempt; doubled for every following one.
    pub base_delay: Duration,
    /// Cap for a single delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: Duration::from_millis(DEFAULT_BASE_DELAY_MS),
            max_delay: Duration::from_millis(DEFAULT_MAX_DELAY_MS),
        }
    }
}

impl RetryPolicy {
    /// Same attempt budget, no sleeping between attempts.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Delay to wait after the given (1-based) failed attempt.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// Runs `operation`, retrying transient failures.
    ///
    /// The last error is returned unchanged once attempts are exhausted, so
    /// callers can still tell a transient failure from a fatal one.
    pub async fn run<T, F, Fut>(&self, label: &str, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match operation().await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!("{} succeeded on attempt {}", label, attempt);
                    }
                    return Ok(value);
                }
                Err(err) if err.retry_class() == RetryClass::WithBackoff && attempt < max_attempts => {
                    let delay = self.delay_for(attempt);
                    warn!(
                        "{} failed (attempt {}/{}): {}. Retrying in {:?}",
                        label, attempt, max_attempts, err, delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    if err.retry_class() == RetryClass::WithBackoff {
                        warn!("{} gave up after {} attempts: {}", label, attempt, err);
                    }
                    return Err(err);
                }
            }
        }
    }
}
