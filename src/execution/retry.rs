//! Bounded exponential backoff for transient stage failures

use crate::core::config::RetryConfig;
use crate::core::ErrorKind;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts for `InferenceUnavailable`, including the first
    pub max_attempts: usize,
    /// Attempts for `Timeout`, including the first
    pub timeout_attempts: usize,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryConfig::default().into()
    }
}

impl From<RetryConfig> for RetryPolicy {
    fn from(config: RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            timeout_attempts: config.timeout_attempts,
            base_delay: Duration::from_millis(config.base_delay_ms),
        }
    }
}

impl RetryPolicy {
    /// Total attempts allowed for an error kind
    pub fn attempts_for(&self, kind: ErrorKind) -> usize {
        match kind {
            ErrorKind::InferenceUnavailable => self.max_attempts,
            ErrorKind::Timeout => self.timeout_attempts,
            _ => 1,
        }
    }

    /// Whether another attempt may follow failed attempt number `attempt`
    pub fn should_retry(&self, kind: ErrorKind, attempt: usize) -> bool {
        kind.is_retryable() && attempt < self.attempts_for(kind)
    }

    /// Delay before the attempt following attempt number `attempt`
    pub fn delay(&self, attempt: usize) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16) as u32;
        self.base_delay.saturating_mul(1u32 << exponent)
    }
}
