//! Retry policy for provider calls.
//!
//! Transient provider failures are retried with bounded exponential backoff.
//! The policy decides whether and how long to wait; a [`Sleeper`] performs
//! the wait so tests can run without real delays.

use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::ports::AIError;

/// Performs backoff waits.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Records requested waits without sleeping.
#[derive(Debug, Clone, Default)]
pub struct RecordingSleeper {
    waits: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits requested so far, in order.
    pub fn waits(&self) -> Vec<Duration> {
        self.waits.lock().map(|w| w.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        if let Ok(mut waits) = self.waits.lock() {
            waits.push(duration);
        }
    }
}

/// A value together with the number of attempts it took.
#[derive(Debug, Clone, PartialEq)]
pub struct Attempted<T> {
    pub value: T,
    pub attempts: u32,
}

/// Bounded exponential backoff.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
    retryable: fn(&AIError) -> bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(500))
    }
}

impl RetryPolicy {
    /// Creates a policy making at most `max_attempts` calls, doubling from `base_delay`.
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay: Duration::from_secs(8),
            retryable: AIError::is_retryable,
        }
    }

    /// Caps a single backoff wait.
    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Replaces the retryable-error predicate.
    pub fn with_predicate(mut self, retryable: fn(&AIError) -> bool) -> Self {
        self.retryable = retryable;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// True if a call that failed with `error` on attempt `attempt` (1-based) should be retried.
    pub fn should_retry(&self, error: &AIError, attempt: u32) -> bool {
        attempt < self.max_attempts && (self.retryable)(error)
    }

    /// Wait before retry number `retry` (1-based): `base * 2^(retry-1)`, capped.
    ///
    /// A provider's retry-after hint raises the wait, still within the cap.
    pub fn delay_for(&self, retry: u32, error: &AIError) -> Duration {
        let exponent = retry.saturating_sub(1).min(16);
        let backoff = self.base_delay.saturating_mul(1u32 << exponent);
        let hinted = match error {
            AIError::RateLimited { retry_after_secs } => {
                backoff.max(Duration::from_secs(u64::from(*retry_after_secs)))
            }
            _ => backoff,
        };
        hinted.min(self.max_delay)
    }

    /// Runs `operation` until it succeeds, fails permanently, or attempts run out.
    pub async fn execute<T, F, Fut>(
        &self,
        sleeper: &dyn Sleeper,
        mut operation: F,
    ) -> Result<Attempted<T>, Attempted<AIError>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, AIError>>,
    {
        let mut attempt = 1;
        loop {
            match operation(attempt).await {
                Ok(value) => return Ok(Attempted { value, attempts: attempt }),
                Err(error) if self.should_retry(&error, attempt) => {
                    let delay = self.delay_for(attempt, &error);
                    tracing::warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "provider call failed, retrying"
                    );
                    sleeper.sleep(delay).await;
                    attempt += 1;
                }
                Err(error) => {
                    return Err(Attempted {
                        value: error,
                        attempts: attempt,
                    })
                }
            }
        }
    }
}
