//! BizLens Core - Request Types
//!
//! Pure data structures shared by the orchestrator, the service layer and the
//! test utilities. The only trait here is [`Transport`], the seam between the
//! orchestrator and the network.

pub mod config;
pub mod constants;
pub mod envelope;
pub mod error;
pub mod request;
pub mod state;
pub mod transport;

pub use config::OrchestratorConfig;
pub use envelope::ApiEnvelope;
pub use error::{BizlensError, BizlensResult, ConfigError, RequestError};
pub use request::{CacheKey, Method, MethodParseError, RequestOptions};
pub use state::{CircuitState, CircuitStateParseError, DrainState};
pub use transport::Transport;
