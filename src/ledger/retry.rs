//! Retry policy for units of work
//!
//! Exponential backoff with jitter, bounded by a total attempt count.

use rand::Rng;
use std::time::Duration;

use super::error::LedgerError;
use crate::config::RetryConfig;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_backoff: Duration,
    max_backoff: Duration,
    retry_connection_errors: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_backoff: Duration::from_millis(config.base_backoff_ms),
            max_backoff: Duration::from_millis(config.max_backoff_ms.max(config.base_backoff_ms)),
            retry_connection_errors: config.retry_connection_errors,
        }
    }
}

impl RetryPolicy {
    /// Run every unit exactly once.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            base_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
            retry_connection_errors: false,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Whether a unit that failed on `attempt` (1-based) may run again.
    pub fn should_retry(&self, err: &LedgerError, attempt: u32) -> bool {
        if attempt >= self.max_attempts {
            return false;
        }
        err.is_transient() || (self.retry_connection_errors && err.is_connection())
    }

    /// Delay before attempt `attempt + 1`.
    ///
    /// Ceiling doubles per attempt up to `max_backoff`; the actual delay is
    /// drawn from `[ceiling / 2, ceiling]` so colliding units spread out.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(16);
        let ceiling = self
            .base_backoff
            .saturating_mul(1u32 << exp)
            .min(self.max_backoff);
        if ceiling.is_zero() {
            return ceiling;
        }

        let ceiling_us = ceiling.as_micros() as u64;
        let jittered = rand::thread_rng().gen_range(ceiling_us / 2..=ceiling_us);
        Duration::from_micros(jittered)
    }
}
