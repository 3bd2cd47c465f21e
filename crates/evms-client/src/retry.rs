//! Retry with exponential backoff for per-entry store reads.
//!
//! Only transient failures ([`StoreError::is_transient`]) are retried.
//! Everything else, including a successful "entry missing" answer, is
//! returned immediately.

use std::future::Future;
use std::time::Duration;

use crate::error::StoreError;

/// How many times to re-issue a failed read, and how long to wait first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retry attempts after the initial request.
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each further attempt.
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Issue each read exactly once.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::ZERO,
        }
    }

    fn delay(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }

    /// Number of requests a fully exhausted read issues.
    pub fn attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Sum of every backoff delay a fully exhausted read sleeps through.
    pub fn total_delay(&self) -> Duration {
        (0..self.max_retries).fold(Duration::ZERO, |acc, attempt| {
            acc.saturating_add(self.delay(attempt))
        })
    }
}

impl Default for RetryPolicy {
    /// Two retries: 200ms, then 400ms.
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(200),
        }
    }
}

/// Run `f` until it succeeds, fails non-transiently, or the policy is
/// exhausted.
pub(crate) async fn retry_transient<T, F, Fut>(
    policy: &RetryPolicy,
    what: &str,
    f: F,
) -> Result<T, StoreError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, StoreError>>,
{
    for attempt in 0..policy.max_retries {
        match f().await {
            Err(e) if e.is_transient() => {
                let delay = policy.delay(attempt);
                tracing::warn!(
                    attempt = attempt + 1,
                    max_retries = policy.max_retries,
                    "{what} failed, retrying in {delay:?}: {e}"
                );
                tokio::time::sleep(delay).await;
            }
            other => return other,
        }
    }
    // Final attempt, no more retries.
    f().await
}
