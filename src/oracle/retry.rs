//! Retry policy with exponential backoff for transient oracle failures
//!
//! - Attempts: bounded by `max_retries` (total calls, first included)
//! - Delay: `base * 2^attempt`, capped, with ±25% jitter
//! - Only transient errors are retried; everything else returns at once

use async_trait::async_trait;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

use crate::errors::{Result, TutorError};
use crate::oracle::types::{ChatMessage, CompletionOptions};
use crate::oracle::Oracle;

/// Maximum delay cap (16 seconds)
const MAX_DELAY_MS: u64 = 16_000;

/// Bounded retry policy
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    max_retries: u32,

    /// Base delay in milliseconds
    base_delay_ms: u64,

    /// Maximum delay cap in milliseconds
    max_delay_ms: u64,

    /// Enable jitter
    enable_jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(500))
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries: max_retries.max(1),
            base_delay_ms: base_delay.as_millis() as u64,
            max_delay_ms: MAX_DELAY_MS,
            enable_jitter: true,
        }
    }

    /// A policy that calls once and never retries
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Execute operation with retry logic
    pub async fn execute_with_retry<F, Fut, T>(&self, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let mut attempt = 0;

        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    if !Self::is_retryable(&e) {
                        return Err(e);
                    }

                    attempt += 1;
                    if attempt >= self.max_retries {
                        warn!(attempts = attempt, error = %e, "Giving up after transient failures");
                        return Err(e);
                    }

                    let delay = self.calculate_delay(attempt - 1);
                    warn!(attempt, delay_ms = delay.as_millis() as u64, error = %e, "Transient failure, retrying");
                    sleep(delay).await;
                }
            }
        }
    }

    /// Calculate delay for given attempt number
    fn calculate_delay(&self, attempt: u32) -> Duration {
        let exponential_delay = self
            .base_delay_ms
            .saturating_mul(2u64.saturating_pow(attempt));
        let delay_ms = exponential_delay.min(self.max_delay_ms);

        let final_delay = if self.enable_jitter {
            let jitter = (delay_ms / 4) as i64;
            let random_jitter = (rand::random::<f64>() * 2.0 - 1.0) * jitter as f64;
            ((delay_ms as i64) + random_jitter as i64).max(0) as u64
        } else {
            delay_ms
        };

        Duration::from_millis(final_delay)
    }

    /// Whether an error is worth another attempt
    pub fn is_retryable(error: &TutorError) -> bool {
        match error {
            TutorError::Timeout { .. } => true,
            TutorError::HttpError(_) => true,
            // Rate limits and server-side failures; 4xx otherwise means a bad request.
            TutorError::OracleApi { status: Some(status), .. } => {
                *status == 429 || (500..600).contains(status)
            }
            _ => false,
        }
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }
}

/// Oracle decorator applying a [`RetryPolicy`] to every call
pub struct RetryingOracle<O> {
    inner: O,
    policy: RetryPolicy,
}

impl<O: Oracle> RetryingOracle<O> {
    pub fn new(inner: O, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn inner(&self) -> &O {
        &self.inner
    }
}

#[async_trait]
impl<O: Oracle> Oracle for RetryingOracle<O> {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> Result<String> {
        self.policy
            .execute_with_retry(|| self.inner.complete(messages, options))
            .await
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
