//! BizLens Test Utilities
//!
//! Shared test infrastructure for the BizLens workspace:
//! - `MockTransport` - scripted responses with a recorded call log
//! - Proptest generators for request and config types
//! - Test fixtures for common payloads and configs
//! - Assertions on orchestrator error variants

pub use bizlens_core::{
    ApiEnvelope, BizlensError, BizlensResult, CacheKey, Method, OrchestratorConfig,
    RequestError, RequestOptions, Transport,
};

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

// ============================================================================
// MOCK TRANSPORT
// ============================================================================

/// Scripted outcome of one mock call.
#[derive(Debug, Clone, PartialEq)]
pub enum MockResponse {
    Data(Value),
    Error(RequestError),
    /// Panic inside `send` with this message
    Panic(String),
}

impl MockResponse {
    fn into_result(self) -> Result<Value, RequestError> {
        match self {
            Self::Data(value) => Ok(value),
            Self::Error(err) => Err(err),
            Self::Panic(message) => panic!("{}", message),
        }
    }
}

/// One call observed by [`MockTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRecord {
    pub method: Method,
    pub endpoint: String,
    pub body: Option<String>,
    /// Tokio clock reading when the call started
    pub at: Instant,
}

#[derive(Debug, Default)]
struct MockState {
    scripted: HashMap<String, VecDeque<MockResponse>>,
    sticky: HashMap<String, MockResponse>,
    latency: HashMap<String, Duration>,
    calls: Vec<CallRecord>,
}

/// In-memory [`Transport`] for tests.
///
/// Responses are matched by exact endpoint. One-shot responses are consumed
/// in order; once exhausted the sticky response (if any) repeats. Unscripted
/// endpoints fail with a 404 transport error.
#[derive(Debug)]
pub struct MockTransport {
    state: Mutex<MockState>,
    healthy: AtomicBool,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState::default()),
            healthy: AtomicBool::new(true),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue a one-shot response for `endpoint`.
    pub fn respond(&self, endpoint: &str, response: MockResponse) -> &Self {
        self.lock()
            .scripted
            .entry(endpoint.to_string())
            .or_default()
            .push_back(response);
        self
    }

    pub fn respond_ok(&self, endpoint: &str, data: Value) -> &Self {
        self.respond(endpoint, MockResponse::Data(data))
    }

    pub fn respond_err(&self, endpoint: &str, error: RequestError) -> &Self {
        self.respond(endpoint, MockResponse::Error(error))
    }

    /// Answer every call to `endpoint` with `response` once one-shots run out.
    pub fn respond_always(&self, endpoint: &str, response: MockResponse) -> &Self {
        self.lock().sticky.insert(endpoint.to_string(), response);
        self
    }

    /// Delay every call to `endpoint` by `latency` (tokio time).
    pub fn with_latency(&self, endpoint: &str, latency: Duration) -> &Self {
        self.lock().latency.insert(endpoint.to_string(), latency);
        self
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }

    /// All calls so far, in arrival order.
    pub fn calls(&self) -> Vec<CallRecord> {
        self.lock().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.lock().calls.len()
    }

    /// Number of calls made to `endpoint`.
    pub fn calls_to(&self, endpoint: &str) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.endpoint == endpoint)
            .count()
    }

    /// Endpoints in call order.
    pub fn endpoints(&self) -> Vec<String> {
        self.lock().calls.iter().map(|c| c.endpoint.clone()).collect()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, endpoint: &str, options: &RequestOptions) -> Result<Value, RequestError> {
        let latency = {
            let mut state = self.lock();
            state.calls.push(CallRecord {
                method: options.method(),
                endpoint: endpoint.to_string(),
                body: options.body.clone(),
                at: Instant::now(),
            });
            state.latency.get(endpoint).copied()
        };

        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        let response = {
            let mut state = self.lock();
            let scripted = state
                .scripted
                .get_mut(endpoint)
                .and_then(|queue| queue.pop_front());
            scripted.or_else(|| state.sticky.get(endpoint).cloned())
        };

        match response {
            Some(response) => response.into_result(),
            None => Err(RequestError::Transport {
                status: Some(404),
                message: format!("No mock response for {}", endpoint),
            }),
        }
    }

    async fn health(&self) -> bool {
        self.healthy.load(Ordering::SeqCst)
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for BizLens request and config types.

    use super::*;
    use proptest::prelude::*;

    pub fn arb_method() -> impl Strategy<Value = Method> {
        prop_oneof![
            Just(Method::Get),
            Just(Method::Post),
            Just(Method::Put),
            Just(Method::Patch),
            Just(Method::Delete),
        ]
    }

    /// Endpoint paths shaped like the dashboard API's.
    pub fn arb_endpoint() -> impl Strategy<Value = String> {
        prop::collection::vec("[a-z][a-z-]{0,12}", 1..4)
            .prop_map(|segments| format!("/{}", segments.join("/")))
    }

    /// Request options with an optional method override and optional body.
    pub fn arb_request_options() -> impl Strategy<Value = RequestOptions> {
        (
            proptest::option::of(arb_method()),
            proptest::option::of("[ -~]{0,64}"),
        )
            .prop_map(|(method, body)| RequestOptions {
                method,
                body,
                headers: Vec::new(),
            })
    }

    pub fn arb_request_error() -> impl Strategy<Value = RequestError> {
        prop_oneof![
            (proptest::option::of(400u16..600), "[a-z ]{0,20}")
                .prop_map(|(status, message)| RequestError::Transport { status, message }),
            "[a-z ]{0,20}".prop_map(|message| RequestError::Api {
                message,
                details: None
            }),
            proptest::option::of(0u64..60_000).prop_map(|ms| RequestError::RateLimited {
                retry_after: ms.map(Duration::from_millis)
            }),
            (1usize..100).prop_map(|capacity| RequestError::QueueFull { capacity }),
        ]
    }

    /// A config that passes validation.
    pub fn arb_valid_config() -> impl Strategy<Value = OrchestratorConfig> {
        (
            0u64..1_000,
            1u64..120_000,
            1u64..120_000,
            1usize..200,
            0u64..600_000,
            0u32..=5,
            0u64..5_000,
        )
            .prop_map(
                |(interval, backoff, stale, queue, ttl, retries, delay)| OrchestratorConfig {
                    min_request_interval: Duration::from_millis(interval),
                    rate_limit_backoff: Duration::from_millis(backoff),
                    stale_threshold: Duration::from_millis(stale),
                    max_queue_size: queue,
                    default_cache_ttl: Duration::from_millis(ttl),
                    max_retries: retries,
                    retry_delay: Duration::from_millis(delay),
                },
            )
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built payloads and configs for common scenarios.

    use super::*;
    use serde_json::json;

    /// Default orchestrator settings: 200 ms pacing, 30 s backoff,
    /// 30 s staleness, 30 s cache TTL, one retry after 1 s.
    pub fn default_config() -> OrchestratorConfig {
        OrchestratorConfig::default()
    }

    /// Default settings with retries disabled.
    pub fn no_retry_config() -> OrchestratorConfig {
        OrchestratorConfig {
            max_retries: 0,
            ..OrchestratorConfig::default()
        }
    }

    pub fn tables_payload() -> Value {
        json!(["customers", "orders"])
    }

    pub fn table_list_payload() -> Value {
        json!([
            {"id": 1, "name": "customers", "records": "1,204", "lastUpdate": "2 ч назад", "status": "Активна"},
            {"id": 2, "name": "orders", "records": "8,311", "lastUpdate": "5 мин назад", "status": "Активна", "schema": "public"}
        ])
    }

    pub fn database_stats_payload() -> Value {
        json!({
            "totalTables": 14,
            "totalRecords": 48210,
            "databaseSize": "56 MB",
            "activeConnections": 4,
            "newTables": 2,
            "newRecords": 310,
            "sizeGrowth": "3 MB",
            "maxConnections": 100
        })
    }

    pub fn query_result_payload() -> Value {
        json!({
            "rows": [{"count": 42}],
            "rowCount": 1,
            "executionTime": 7,
            "fields": [{"name": "count", "dataTypeID": 20}]
        })
    }

    pub fn server_error() -> RequestError {
        transport_error(500, "Internal Server Error")
    }

    pub fn transport_error(status: u16, message: &str) -> RequestError {
        RequestError::Transport {
            status: Some(status),
            message: message.to_string(),
        }
    }

    pub fn network_error() -> RequestError {
        RequestError::Transport {
            status: None,
            message: "connection refused".to_string(),
        }
    }

    pub fn api_error(message: &str) -> RequestError {
        RequestError::Api {
            message: message.to_string(),
            details: None,
        }
    }

    pub fn rate_limited() -> RequestError {
        RequestError::RateLimited { retry_after: None }
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions on orchestrator error variants.

    use super::*;

    #[track_caller]
    pub fn assert_rate_limited<T: std::fmt::Debug>(result: &Result<T, RequestError>) {
        match result {
            Err(RequestError::RateLimited { .. }) => {}
            other => panic!("Expected RateLimited error, got: {:?}", other),
        }
    }

    #[track_caller]
    pub fn assert_service_unavailable<T: std::fmt::Debug>(result: &Result<T, RequestError>) {
        match result {
            Err(RequestError::ServiceUnavailable { .. }) => {}
            other => panic!("Expected ServiceUnavailable error, got: {:?}", other),
        }
    }

    #[track_caller]
    pub fn assert_queue_full<T: std::fmt::Debug>(result: &Result<T, RequestError>) {
        match result {
            Err(RequestError::QueueFull { .. }) => {}
            other => panic!("Expected QueueFull error, got: {:?}", other),
        }
    }

    #[track_caller]
    pub fn assert_queue_timeout<T: std::fmt::Debug>(result: &Result<T, RequestError>) {
        match result {
            Err(RequestError::QueueTimeout { .. }) => {}
            other => panic!("Expected QueueTimeout error, got: {:?}", other),
        }
    }

    #[track_caller]
    pub fn assert_transport_error<T: std::fmt::Debug>(
        result: &Result<T, RequestError>,
        expected_status: Option<u16>,
    ) {
        match result {
            Err(RequestError::Transport { status, .. }) => {
                assert_eq!(*status, expected_status, "Wrong transport status")
            }
            other => panic!("Expected Transport error, got: {:?}", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_mock_one_shot_then_sticky() {
        let mock = MockTransport::new();
        mock.respond_ok("/a", json!(1))
            .respond_always("/a", MockResponse::Data(json!(2)));

        let opts = RequestOptions::get();
        assert_eq!(mock.send("/a", &opts).await.unwrap(), json!(1));
        assert_eq!(mock.send("/a", &opts).await.unwrap(), json!(2));
        assert_eq!(mock.send("/a", &opts).await.unwrap(), json!(2));
        assert_eq!(mock.calls_to("/a"), 3);
    }

    #[tokio::test]
    async fn test_mock_unscripted_endpoint_is_404() {
        let mock = MockTransport::new();
        let result = mock.send("/missing", &RequestOptions::get()).await;
        assertions::assert_transport_error(&result, Some(404));
        assert_eq!(mock.endpoints(), vec!["/missing".to_string()]);
    }

    #[tokio::test]
    async fn test_mock_records_method_and_body() {
        let mock = MockTransport::new();
        mock.respond_ok("/q", json!(null));
        let opts = RequestOptions::post().body("SELECT 1");
        mock.send("/q", &opts).await.unwrap();

        let call = &mock.calls()[0];
        assert_eq!(call.method, Method::Post);
        assert_eq!(call.body.as_deref(), Some("SELECT 1"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_mock_latency_uses_tokio_clock() {
        let mock = MockTransport::new();
        mock.respond_ok("/slow", json!(1))
            .with_latency("/slow", Duration::from_secs(5));

        let start = Instant::now();
        mock.send("/slow", &RequestOptions::get()).await.unwrap();
        assert!(start.elapsed() >= Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_mock_health_toggle() {
        let mock = MockTransport::new();
        assert!(mock.health().await);
        mock.set_healthy(false);
        assert!(!mock.health().await);
    }
}
