//! Bounded retry for backend connection establishment
//!
//! Binary exponential backoff with ±25% jitter, capped per delay and
//! bounded by a caller-configurable attempt count. Applied only before the
//! first token; the pipeline never retries mid-stream.

use crate::errors::{QaError, Result};
use std::time::Duration;
use tokio::time::sleep;

/// Default attempt bound
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Base delay for exponential backoff
const BASE_DELAY_MS: u64 = 500;

/// Per-delay cap
const MAX_DELAY_MS: u64 = 8000;

/// Retry policy for establishing backend calls
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay_ms: u64,
    enable_jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS)
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay_ms: BASE_DELAY_MS,
            enable_jitter: true,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Run an operation, retrying transient failures up to the attempt
    /// bound. Non-retryable errors surface immediately.
    pub async fn run<F, Fut, T>(&self, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let mut attempt = 0;

        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    attempt += 1;

                    if !e.is_retryable() || attempt >= self.max_attempts {
                        return Err(e);
                    }

                    let delay = self.delay_for(attempt);
                    tracing::debug!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "retrying backend call"
                    );
                    sleep(delay).await;
                }
            }
        }
    }

    fn delay_for(&self, attempt: u32) -> Duration {
        let exponential = self.base_delay_ms.saturating_mul(2u64.pow(attempt - 1));
        let capped = exponential.min(MAX_DELAY_MS);

        let final_ms = if self.enable_jitter {
            let jitter = (capped / 4) as i64;
            let offset = (rand::random::<f64>() * 2.0 - 1.0) * jitter as f64;
            ((capped as i64) + offset as i64).max(0) as u64
        } else {
            capped
        };

        Duration::from_millis(final_ms)
    }
}
