//! Bounded retries with linear backoff

use crate::config::RiskOracleConfig;
use crate::error::OracleError;
use std::future::Future;
use std::time::Duration;

/// Retry budget for one external lookup
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first (at least one is always made)
    pub max_attempts: u32,
    /// Delay unit; after failed attempt `n` the policy waits `n * base_delay`
    pub base_delay: Duration,
    /// Per-attempt timeout
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RiskOracleConfig::default())
    }
}

impl RetryPolicy {
    pub fn from_config(config: &RiskOracleConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            base_delay: config.retry_delay(),
            timeout: config.timeout(),
        }
    }

    /// Delay before the attempt following failed attempt `attempt` (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }

    /// Run `operation` until it succeeds or the budget is spent
    pub async fn run<T, F, Fut>(&self, operation: &str, mut f: F) -> Result<T, OracleError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, OracleError>>,
    {
        let attempts = self.max_attempts.max(1);
        let mut last_error = None;

        for attempt in 1..=attempts {
            let outcome = match tokio::time::timeout(self.timeout, f()).await {
                Ok(result) => result,
                Err(_) => Err(OracleError::Timeout(self.timeout.as_millis() as u64)),
            };

            match outcome {
                Ok(value) => return Ok(value),
                Err(err) => {
                    if attempt < attempts {
                        let delay = self.delay_for(attempt);
                        tracing::warn!(
                            operation,
                            attempt,
                            delay_ms = delay.as_millis() as u64,
                            error = %err,
                            "risk lookup failed, retrying"
                        );
                        tokio::time::sleep(delay).await;
                    }
                    last_error = Some(err);
                }
            }
        }

        Err(OracleError::Exhausted {
            attempts,
            last: Box::new(last_error.unwrap_or(OracleError::NotConfigured)),
        })
    }
}
