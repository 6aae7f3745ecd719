//! Retry policy

use bizlens_core::{OrchestratorConfig, RequestError};
use std::time::Duration;

/// Fixed-delay retry for transport failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, delay: Duration) -> Self {
        Self { max_retries, delay }
    }

    /// No retries at all.
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Whether a failure on attempt `attempt` (0 = first call) earns a retry.
    ///
    /// Only [`RequestError::Transport`] is retried. API errors are the
    /// server's answer and rate limits trip the breaker instead.
    pub fn should_retry(&self, error: &RequestError, attempt: u32) -> bool {
        attempt < self.max_retries && matches!(error, RequestError::Transport { .. })
    }
}

impl From<&OrchestratorConfig> for RetryPolicy {
    fn from(config: &OrchestratorConfig) -> Self {
        Self::new(config.max_retries, config.retry_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&OrchestratorConfig::default())
    }
}
