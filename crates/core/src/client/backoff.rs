//! Exponential-backoff retry loop.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::warn;

use crate::errors::{FetchError, RetryClass};

/// Retry tuning for the HTTP client.
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    /// Maximum number of retries after the initial attempt.
    pub max_retries: u32,
    /// Delay for the first retry, doubled on each subsequent one.
    pub base_delay: Duration,
    /// Upper bound on the computed delay, applied before jitter.
    pub max_delay: Duration,
    /// Exclusive upper bound of the random jitter added to each computed
    /// delay. Zero disables jitter.
    pub jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
            jitter: Duration::from_millis(1000),
        }
    }
}

/// Compute the delay before retrying a zero-indexed `attempt`:
/// `min(base * 2^attempt, max_delay)` plus random jitter.
fn backoff_delay(policy: &RetryPolicy, attempt: u32) -> Duration {
    let exponential = policy
        .base_delay
        .saturating_mul(2u32.saturating_pow(attempt));
    let capped = exponential.min(policy.max_delay);

    let jitter_ms = policy.jitter.as_millis() as u64;
    if jitter_ms == 0 {
        return capped;
    }
    capped + Duration::from_millis(rand::thread_rng().gen_range(0..jitter_ms))
}

/// Run `op` until it succeeds, retrying transient failures.
///
/// At most `policy.max_retries + 1` attempts are made in total. Only errors
/// whose [`retry_class`](FetchError::retry_class) is not
/// [`RetryClass::Never`] are retried, and a server-provided delay
/// ([`RetryClass::AfterDelay`]) replaces the computed backoff for that
/// attempt. Once the budget is exhausted the last error is returned
/// unchanged, so callers still see the original classification.
pub async fn retry_with_backoff<T, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T, FetchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let mut attempt: u32 = 0;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                let class = err.retry_class();
                if class == RetryClass::Never || attempt >= policy.max_retries {
                    return Err(err);
                }

                let delay = match class {
                    RetryClass::AfterDelay(server_delay) => server_delay,
                    _ => backoff_delay(policy, attempt),
                };

                warn!(
                    "attempt {} failed ({}), retrying in {:?}",
                    attempt + 1,
                    err,
                    delay
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
