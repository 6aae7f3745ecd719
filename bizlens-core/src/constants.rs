//! Constants for the BizLens client
//!
//! Default values for the request orchestrator. Every one of them can be
//! overridden through [`crate::OrchestratorConfig`].

// ============================================================================
// PACING
// ============================================================================

/// Minimum spacing between two dequeued network calls (milliseconds)
pub const DEFAULT_MIN_REQUEST_INTERVAL_MS: u64 = 200;

// ============================================================================
// CIRCUIT BREAKER
// ============================================================================

/// How long the breaker stays open after a rate-limit response (milliseconds)
pub const DEFAULT_RATE_LIMIT_BACKOFF_MS: u64 = 30_000;

// ============================================================================
// QUEUE
// ============================================================================

/// Maximum time a job may wait in the queue before it is discarded (milliseconds)
pub const DEFAULT_STALE_THRESHOLD_MS: u64 = 30_000;

/// Upper bound for the backoff and staleness windows (milliseconds)
pub const MAX_WINDOW_MS: u64 = 86_400_000;

/// Maximum number of jobs waiting in the queue
pub const DEFAULT_MAX_QUEUE_SIZE: usize = 50;

// ============================================================================
// CACHE
// ============================================================================

/// TTL used when a caller does not pass one (milliseconds)
pub const DEFAULT_CACHE_TTL_MS: u64 = 30_000;

// ============================================================================
// RETRY
// ============================================================================

/// Retries allowed for a transport failure
pub const DEFAULT_MAX_RETRIES: u32 = 1;

/// Upper bound accepted by config validation
pub const MAX_ALLOWED_RETRIES: u32 = 5;

/// Fixed delay before a retry (milliseconds)
pub const DEFAULT_RETRY_DELAY_MS: u64 = 1_000;

// ============================================================================
// HTTP
// ============================================================================

/// Default per-request timeout for the HTTP transport (milliseconds)
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 15_000;

/// Development API base URL
pub const DEV_API_BASE_URL: &str = "http://localhost:3001/api";

/// Message used when a failed envelope carries no `error` field
pub const DEFAULT_API_ERROR_MESSAGE: &str = "API returned an error";
