//! Bounded retry with a fixed delay between attempts.
//!
//! Infrastructure converges asynchronously (instances boot, DNS propagates,
//! load balancers register targets), so verifiers poll instead of waiting a
//! fixed time. The caller is suspended for the delay between attempts; there
//! is no sleep after the last attempt.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, error, warn};

use crate::domain::config::RetryConfig;
use crate::domain::error::RetryError;
use crate::domain::terraform::retryable_reason;

/// Attempt budget and spacing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    /// 30 attempts, 5 seconds apart.
    pub const DEFAULT: RetryPolicy = RetryPolicy {
        attempts: 30,
        delay: Duration::from_secs(5),
    };

    #[must_use]
    pub fn new(attempts: u32, delay: Duration) -> Self {
        Self { attempts, delay }
    }

    /// Longest time the poller can spend sleeping: `(attempts - 1) * delay`.
    #[must_use]
    pub fn max_wait(&self) -> Duration {
        self.delay * self.attempts.saturating_sub(1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(cfg: &RetryConfig) -> Self {
        Self::new(cfg.attempts, cfg.delay())
    }
}

/// Run `operation` until it succeeds or `policy.attempts` calls have failed.
///
/// # Errors
///
/// Returns `RetryError::Exhausted` with the last underlying error, or
/// `RetryError::InvalidPolicy` for a zero-attempt budget.
pub async fn do_with_retry<T, F, Fut>(
    description: &str,
    policy: RetryPolicy,
    mut operation: F,
) -> Result<T, RetryError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = anyhow::Result<T>>,
{
    if policy.attempts == 0 {
        return Err(RetryError::InvalidPolicy(description.to_string()));
    }

    let mut attempt = 1u32;
    loop {
        debug!(description, attempt, max_attempts = policy.attempts, "attempting");
        match operation().await {
            Ok(value) => {
                debug!(description, attempt, "succeeded");
                return Ok(value);
            }
            Err(err) if attempt >= policy.attempts => {
                error!(
                    description,
                    attempts = attempt,
                    error = %format!("{err:#}"),
                    "giving up"
                );
                return Err(RetryError::Exhausted {
                    description: description.to_string(),
                    attempts: attempt,
                    last: err,
                });
            }
            Err(err) => {
                warn!(
                    description,
                    attempt,
                    max_attempts = policy.attempts,
                    error = %format!("{err:#}"),
                    delay_secs = policy.delay.as_secs_f64(),
                    "attempt failed, retrying"
                );
                tokio::time::sleep(policy.delay).await;
                attempt += 1;
            }
        }
    }
}

/// Retry only failures whose text matches one of `patterns`.
///
/// `max_retries` counts retries after the first call, so the operation runs
/// at most `max_retries + 1` times. A failure that matches no pattern is
/// returned unchanged on the spot.
///
/// # Errors
///
/// Returns the first non-retryable error, an invalid-pattern error, or
/// `RetryError::Exhausted` once the retries are used up.
pub async fn do_with_retryable_errors<T, F, Fut>(
    description: &str,
    patterns: &std::collections::BTreeMap<String, String>,
    max_retries: u32,
    delay: Duration,
    mut operation: F,
) -> anyhow::Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = anyhow::Result<T>>,
{
    let attempts = max_retries.saturating_add(1);
    let mut attempt = 1u32;
    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        let text = format!("{err:#}");
        let Some(reason) = retryable_reason(&text, patterns)? else {
            return Err(err);
        };
        if attempt >= attempts {
            return Err(RetryError::Exhausted {
                description: description.to_string(),
                attempts: attempt,
                last: err,
            }
            .into());
        }
        warn!(description, attempt, %reason, "retryable error, trying again");
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}
