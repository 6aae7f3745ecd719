//! BizLens CLI library exports.

pub mod command;
pub mod config;
pub mod error;

use bizlens_client::{HttpTransport, RequestOrchestrator};
use config::ClientConfig;
use error::CliError;
use std::sync::Arc;

/// Build the HTTP transport and orchestrator described by `config`.
pub fn build_orchestrator(config: &ClientConfig) -> Result<RequestOrchestrator, CliError> {
    let transport = HttpTransport::new(config.api_base_url.trim(), config.request_timeout())?;
    let orchestrator = RequestOrchestrator::new(Arc::new(transport), config.orchestrator_config())?;
    Ok(orchestrator)
}
