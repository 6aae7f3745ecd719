//! The network seam of the orchestrator.

use crate::error::RequestError;
use crate::request::RequestOptions;
use async_trait::async_trait;
use serde_json::Value;

/// One HTTP round trip against the dashboard API.
///
/// Implementations perform exactly one attempt: no retry, caching or pacing.
/// A successful call returns the envelope's `data` payload.
///
/// # Errors
/// * [`RequestError::RateLimited`] - the remote answered 429
/// * [`RequestError::Transport`] - network failure or non-2xx status
/// * [`RequestError::Api`] - the envelope's `success` flag was false
/// * [`RequestError::InvalidResponse`] - a 2xx body that is not an envelope
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `options` to `endpoint` (a path relative to the API base URL).
    async fn send(&self, endpoint: &str, options: &RequestOptions) -> Result<Value, RequestError>;

    /// Probe the server's liveness endpoint. Never queued or cached.
    async fn health(&self) -> bool;
}
