//! Error types for the CLI.

use crate::config::ConfigError;
use bizlens_core::{BizlensError, RequestError};

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("{0}")]
    Usage(String),
    #[error(transparent)]
    Request(#[from] RequestError),
    #[error("Failed to render output: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<BizlensError> for CliError {
    fn from(err: BizlensError) -> Self {
        match err {
            BizlensError::Request(e) => Self::Request(e),
            BizlensError::Config(e) => Self::Config(ConfigError::Orchestrator(e)),
        }
    }
}

impl CliError {
    /// Process exit code for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Usage(_) => 2,
            Self::Config(_) => 78,
            Self::Io(_) | Self::Request(_) | Self::Json(_) => 1,
        }
    }
}
