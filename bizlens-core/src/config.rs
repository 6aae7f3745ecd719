//! Orchestrator configuration

use crate::constants::*;
use crate::error::{BizlensResult, ConfigError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tuning knobs for the request orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Minimum spacing between two dequeued network calls
    pub min_request_interval: Duration,
    /// How long the breaker stays open after a rate-limit response
    pub rate_limit_backoff: Duration,
    /// Maximum time a job may sit in the queue before it is discarded
    pub stale_threshold: Duration,
    /// Maximum number of queued jobs
    pub max_queue_size: usize,
    /// TTL for cacheable responses when the caller passes none
    pub default_cache_ttl: Duration,
    /// Retries allowed after a transport failure
    pub max_retries: u32,
    /// Fixed delay before each retry
    pub retry_delay: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            min_request_interval: Duration::from_millis(DEFAULT_MIN_REQUEST_INTERVAL_MS),
            rate_limit_backoff: Duration::from_millis(DEFAULT_RATE_LIMIT_BACKOFF_MS),
            stale_threshold: Duration::from_millis(DEFAULT_STALE_THRESHOLD_MS),
            max_queue_size: DEFAULT_MAX_QUEUE_SIZE,
            default_cache_ttl: Duration::from_millis(DEFAULT_CACHE_TTL_MS),
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
        }
    }
}

impl OrchestratorConfig {
    /// Create OrchestratorConfig from environment variables.
    ///
    /// # Environment Variables
    /// - `BIZLENS_MIN_REQUEST_INTERVAL_MS`: spacing between calls (default: 200)
    /// - `BIZLENS_RATE_LIMIT_BACKOFF_MS`: breaker open window (default: 30000)
    /// - `BIZLENS_STALE_THRESHOLD_MS`: queue staleness limit (default: 30000)
    /// - `BIZLENS_MAX_QUEUE_SIZE`: queue capacity (default: 50)
    /// - `BIZLENS_DEFAULT_CACHE_TTL_MS`: cache TTL (default: 30000)
    /// - `BIZLENS_MAX_RETRIES`: transport retries (default: 1)
    /// - `BIZLENS_RETRY_DELAY_MS`: delay before a retry (default: 1000)
    pub fn from_env() -> Self {
        Self {
            min_request_interval: env_millis(
                "BIZLENS_MIN_REQUEST_INTERVAL_MS",
                DEFAULT_MIN_REQUEST_INTERVAL_MS,
            ),
            rate_limit_backoff: env_millis(
                "BIZLENS_RATE_LIMIT_BACKOFF_MS",
                DEFAULT_RATE_LIMIT_BACKOFF_MS,
            ),
            stale_threshold: env_millis("BIZLENS_STALE_THRESHOLD_MS", DEFAULT_STALE_THRESHOLD_MS),
            max_queue_size: env_parse("BIZLENS_MAX_QUEUE_SIZE", DEFAULT_MAX_QUEUE_SIZE),
            default_cache_ttl: env_millis("BIZLENS_DEFAULT_CACHE_TTL_MS", DEFAULT_CACHE_TTL_MS),
            max_retries: env_parse("BIZLENS_MAX_RETRIES", DEFAULT_MAX_RETRIES),
            retry_delay: env_millis("BIZLENS_RETRY_DELAY_MS", DEFAULT_RETRY_DELAY_MS),
        }
    }

    /// Validate the configuration.
    ///
    /// Validates:
    /// - max_queue_size > 0
    /// - stale_threshold and rate_limit_backoff are positive and at most MAX_WINDOW_MS
    /// - max_retries <= MAX_ALLOWED_RETRIES
    pub fn validate(&self) -> BizlensResult<()> {
        if self.max_queue_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_queue_size".to_string(),
                value: self.max_queue_size.to_string(),
                reason: "max_queue_size must be greater than 0".to_string(),
            }
            .into());
        }

        if self.stale_threshold.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "stale_threshold".to_string(),
                value: format!("{:?}", self.stale_threshold),
                reason: "stale_threshold must be positive".to_string(),
            }
            .into());
        }

        if self.rate_limit_backoff.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "rate_limit_backoff".to_string(),
                value: format!("{:?}", self.rate_limit_backoff),
                reason: "rate_limit_backoff must be positive".to_string(),
            }
            .into());
        }

        let max_window = Duration::from_millis(MAX_WINDOW_MS);
        for (field, window) in [
            ("stale_threshold", self.stale_threshold),
            ("rate_limit_backoff", self.rate_limit_backoff),
        ] {
            if window > max_window {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    value: format!("{:?}", window),
                    reason: format!("{} must be at most {}ms", field, MAX_WINDOW_MS),
                }
                .into());
            }
        }

        if self.max_retries > MAX_ALLOWED_RETRIES {
            return Err(ConfigError::InvalidValue {
                field: "max_retries".to_string(),
                value: self.max_retries.to_string(),
                reason: format!("max_retries must be at most {}", MAX_ALLOWED_RETRIES),
            }
            .into());
        }

        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

fn env_millis(name: &str, default_ms: u64) -> Duration {
    Duration::from_millis(env_parse(name, default_ms))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BizlensError;

    #[test]
    fn test_default_config_is_valid() {
        let config = OrchestratorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.min_request_interval, Duration::from_millis(200));
        assert_eq!(config.rate_limit_backoff, Duration::from_secs(30));
        assert_eq!(config.stale_threshold, Duration::from_secs(30));
        assert_eq!(config.max_retries, 1);
    }

    #[test]
    fn test_zero_queue_size_rejected() {
        let config = OrchestratorConfig {
            max_queue_size: 0,
            ..OrchestratorConfig::default()
        };
        match config.validate() {
            Err(BizlensError::Config(ConfigError::InvalidValue { field, .. })) => {
                assert_eq!(field, "max_queue_size")
            }
            other => panic!("expected invalid max_queue_size, got {:?}", other),
        }
    }

    #[test]
    fn test_zero_stale_threshold_rejected() {
        let config = OrchestratorConfig {
            stale_threshold: Duration::ZERO,
            ..OrchestratorConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_oversized_windows_rejected() {
        let config = OrchestratorConfig {
            rate_limit_backoff: Duration::from_secs(u64::MAX),
            ..OrchestratorConfig::default()
        };
        match config.validate() {
            Err(BizlensError::Config(ConfigError::InvalidValue { field, .. })) => {
                assert_eq!(field, "rate_limit_backoff")
            }
            other => panic!("expected invalid rate_limit_backoff, got {:?}", other),
        }

        let config = OrchestratorConfig {
            stale_threshold: Duration::from_millis(MAX_WINDOW_MS + 1),
            ..OrchestratorConfig::default()
        };
        assert!(config.validate().is_err());

        let config = OrchestratorConfig {
            rate_limit_backoff: Duration::from_millis(MAX_WINDOW_MS),
            stale_threshold: Duration::from_millis(MAX_WINDOW_MS),
            ..OrchestratorConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_backoff_rejected() {
        let config = OrchestratorConfig {
            rate_limit_backoff: Duration::ZERO,
            ..OrchestratorConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_excessive_retries_rejected() {
        let config = OrchestratorConfig {
            max_retries: MAX_ALLOWED_RETRIES + 1,
            ..OrchestratorConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_interval_allowed() {
        let config = OrchestratorConfig {
            min_request_interval: Duration::ZERO,
            retry_delay: Duration::ZERO,
            ..OrchestratorConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_parse_falls_back_on_garbage() {
        std::env::set_var("BIZLENS_TEST_GARBAGE_VALUE", "not-a-number");
        assert_eq!(env_parse("BIZLENS_TEST_GARBAGE_VALUE", 7u32), 7);
        std::env::set_var("BIZLENS_TEST_GOOD_VALUE", " 12 ");
        assert_eq!(env_millis("BIZLENS_TEST_GOOD_VALUE", 1), Duration::from_millis(12));
    }
}
