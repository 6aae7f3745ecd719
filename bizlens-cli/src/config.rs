//! Configuration loading for the BizLens CLI.
//!
//! `api_base_url` and `request_timeout_ms` are required. The optional
//! `[orchestrator]` table overrides individual orchestrator settings on top
//! of the `BIZLENS_*` environment defaults.

use bizlens_core::OrchestratorConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub request_timeout_ms: u64,
    #[serde(default)]
    pub orchestrator: OrchestratorOverrides,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrchestratorOverrides {
    pub min_request_interval_ms: Option<u64>,
    pub rate_limit_backoff_ms: Option<u64>,
    pub stale_threshold_ms: Option<u64>,
    pub max_queue_size: Option<usize>,
    pub default_cache_ttl_ms: Option<u64>,
    pub max_retries: Option<u32>,
    pub retry_delay_ms: Option<u64>,
}

impl OrchestratorOverrides {
    /// Apply the overrides that are set onto `base`.
    pub fn apply(&self, mut base: OrchestratorConfig) -> OrchestratorConfig {
        if let Some(ms) = self.min_request_interval_ms {
            base.min_request_interval = Duration::from_millis(ms);
        }
        if let Some(ms) = self.rate_limit_backoff_ms {
            base.rate_limit_backoff = Duration::from_millis(ms);
        }
        if let Some(ms) = self.stale_threshold_ms {
            base.stale_threshold = Duration::from_millis(ms);
        }
        if let Some(size) = self.max_queue_size {
            base.max_queue_size = size;
        }
        if let Some(ms) = self.default_cache_ttl_ms {
            base.default_cache_ttl = Duration::from_millis(ms);
        }
        if let Some(retries) = self.max_retries {
            base.max_retries = retries;
        }
        if let Some(ms) = self.retry_delay_ms {
            base.retry_delay = Duration::from_millis(ms);
        }
        base
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing configuration file path (use --config or BIZLENS_CONFIG)")]
    MissingConfigPath,
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid config value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
    #[error(transparent)]
    Orchestrator(#[from] bizlens_core::ConfigError),
}

impl ClientConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let args: Vec<String> = std::env::args().skip(1).collect();
        let path = config_path_from_args(&args).or_else(config_path_from_env);
        let path = path.ok_or(ConfigError::MissingConfigPath)?;
        let config = Self::from_path(&path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: ClientConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.api_base_url.trim();
        if url.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "api_base_url",
                reason: "must not be empty".to_string(),
            });
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                field: "api_base_url",
                reason: "must start with http:// or https://".to_string(),
            });
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "request_timeout_ms",
                reason: "must be > 0".to_string(),
            });
        }
        self.orchestrator_config().validate().map_err(|e| match e {
            bizlens_core::BizlensError::Config(inner) => ConfigError::Orchestrator(inner),
            other => ConfigError::InvalidValue {
                field: "orchestrator",
                reason: other.to_string(),
            },
        })?;
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Environment defaults with this file's overrides applied.
    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        self.orchestrator.apply(OrchestratorConfig::from_env())
    }
}

fn config_path_from_env() -> Option<PathBuf> {
    std::env::var("BIZLENS_CONFIG").ok().map(PathBuf::from)
}

/// Value following `--config`, if present.
pub fn config_path_from_args(args: &[String]) -> Option<PathBuf> {
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--config" {
            return iter.next().map(PathBuf::from);
        }
    }
    None
}
