//! Retry with exponential backoff
//!
//! The policy carries the backoff schedule; error classification lives on
//! [`ApiError::is_retryable`] so the rule is testable apart from any network
//! code. `retry_with_backoff` is an explicit higher-order function invoked at
//! each call site rather than a decorator baked into the client.

use crate::client::api::ApiError;
use crate::config::LimitsConfig;
use std::future::Future;
use std::time::Duration;

/// Backoff schedule for retrying failed requests
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Additional attempts after the first failure
    pub max_retries: u32,
    /// Initial delay in seconds
    pub initial_delay_secs: f64,
    /// Delay ceiling in seconds
    pub max_delay_secs: f64,
    /// Exponential base
    pub base: f64,
}

impl RetryPolicy {
    /// Creates a policy with the conventional 1s/60s/2.0 schedule
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            initial_delay_secs: 1.0,
            max_delay_secs: 60.0,
            base: 2.0,
        }
    }

    /// Builds a policy from the configured limits
    pub fn from_limits(limits: &LimitsConfig) -> Self {
        Self {
            max_retries: limits.max_retries,
            initial_delay_secs: limits.initial_retry_delay_secs,
            max_delay_secs: limits.max_retry_delay_secs,
            base: limits.retry_backoff_base,
        }
    }

    /// Delay before retry attempt `attempt` (zero-based):
    /// `min(max_delay, initial_delay * base^attempt)`
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay = self.initial_delay_secs * self.base.powi(attempt as i32);
        Duration::from_secs_f64(delay.min(self.max_delay_secs))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(5)
    }
}

/// Runs `op`, retrying retryable failures per the policy
///
/// A fatal (non-retryable) error is surfaced immediately after a single
/// attempt. On exhaustion the last error is surfaced.
///
/// # Arguments
///
/// * `policy` - The backoff schedule
/// * `what` - Operation name for log messages
/// * `op` - The fallible operation, invoked once per attempt
pub async fn retry_with_backoff<T, F, Fut>(
    policy: &RetryPolicy,
    what: &str,
    mut op: F,
) -> Result<T, ApiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() && attempt < policy.max_retries => {
                let delay = policy.delay_for_attempt(attempt);
                tracing::warn!(
                    "Retryable error in {} (attempt {}/{}): {}. Retrying in {:?}",
                    what,
                    attempt + 1,
                    policy.max_retries,
                    err,
                    delay
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => {
                if err.is_retryable() {
                    tracing::error!("Retries exhausted in {}: {}", what, err);
                } else {
                    tracing::error!("Non-retryable error in {}: {}", what, err);
                }
                return Err(err);
            }
        }
    }
}
