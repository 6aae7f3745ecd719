//! BizLens Client - Request orchestration for the dashboard API
//!
//! Sits between dashboard code and the remote JSON API:
//! - `ResponseCache` - TTL memoization of read requests
//! - `HttpTransport` - one reqwest round trip, envelope normalization
//! - `RequestQueue` - bounded FIFO with pacing and staleness
//! - `RateLimitBreaker` / `RetryPolicy` - rate-limit gate and transport retry
//! - `RequestOrchestrator` - the `call` façade combining all of the above
//!
//! The typed service layer lives in [`services`].

pub mod breaker;
pub mod cache;
pub mod orchestrator;
pub mod policy;
pub mod queue;
pub mod services;
pub mod telemetry;
pub mod transport;

pub use breaker::RateLimitBreaker;
pub use cache::{CacheInfo, ResponseCache};
pub use orchestrator::{OrchestratorStats, RequestOrchestrator};
pub use policy::RetryPolicy;
pub use queue::{DrainStep, JobResult, QueuedJob, RequestQueue};
pub use services::{AdminService, AnalyticsService, DatabaseService};
pub use telemetry::{init_tracing, LogFormat, TelemetryConfig};
pub use transport::HttpTransport;

/// Milliseconds for a log field, saturating at `u64::MAX`.
pub(crate) fn log_millis(duration: std::time::Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

// Re-export core types callers need alongside the client
pub use bizlens_core::{
    ApiEnvelope, BizlensError, BizlensResult, CacheKey, CircuitState, DrainState, Method,
    OrchestratorConfig, RequestError, RequestOptions, Transport,
};

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_log_millis_saturates() {
        assert_eq!(log_millis(Duration::from_millis(1_500)), 1_500);
        assert_eq!(log_millis(Duration::MAX), u64::MAX);
    }
}
