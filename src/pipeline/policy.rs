//! Retry policy: randomness escalation and exponential backoff.

use crate::config::ConstructionConfig;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub randomness_step: f64,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &ConstructionConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            randomness_step: config.randomness_step,
            base_delay: Duration::from_millis(config.retry_delay_ms),
            max_delay: Duration::from_millis(config.max_retry_delay_ms),
        }
    }

    /// Randomness for the retry after failed attempt number `attempt` (1-based)
    pub fn next_randomness(&self, previous: f64, attempt: u32) -> f64 {
        (previous + self.randomness_step * f64::from(attempt)).clamp(0.0, 1.0)
    }

    /// Delay before the retry after failed attempt number `attempt` (1-based)
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let factor = 2u32.saturating_pow(attempt - 1);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// True once `failures` attempts have used up the budget
    pub fn is_exhausted(&self, failures: u32) -> bool {
        failures >= self.max_retries
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&ConstructionConfig::default())
    }
}
