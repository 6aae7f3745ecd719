//! Request orchestrator: cache, queue, pacing, retry and breaker behind `call`.

use crate::breaker::RateLimitBreaker;
use crate::cache::{CacheInfo, ResponseCache};
use crate::log_millis;
use crate::policy::RetryPolicy;
use crate::queue::{DrainStep, JobResult, QueuedJob, RequestQueue};
use bizlens_core::{
    BizlensResult, CacheKey, CircuitState, DrainState, OrchestratorConfig, RequestError,
    RequestOptions, Transport,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::Instant;

// ============================================================================
// STATS
// ============================================================================

/// Point-in-time view of the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrchestratorStats {
    pub queue_len: usize,
    pub drain_state: DrainState,
    pub circuit_state: CircuitState,
    pub consecutive_errors: u32,
    /// Time left in the rate-limit backoff window
    pub rate_limited_for: Duration,
}

// ============================================================================
// ORCHESTRATOR
// ============================================================================

struct Shared {
    transport: Arc<dyn Transport>,
    config: OrchestratorConfig,
    cache: ResponseCache,
    breaker: RateLimitBreaker,
    queue: Mutex<RequestQueue>,
    retry: RetryPolicy,
}

/// Front door to the remote API.
///
/// Cheap to clone; every clone shares one cache, queue and breaker. Build
/// one per process and hand out clones.
#[derive(Clone)]
pub struct RequestOrchestrator {
    shared: Arc<Shared>,
}

impl RequestOrchestrator {
    /// Create an orchestrator over `transport`.
    ///
    /// # Errors
    /// Returns a config error if `config` fails validation.
    pub fn new(transport: Arc<dyn Transport>, config: OrchestratorConfig) -> BizlensResult<Self> {
        config.validate()?;
        let queue = RequestQueue::new(
            config.max_queue_size,
            config.min_request_interval,
            config.stale_threshold,
        );
        let shared = Shared {
            transport,
            retry: RetryPolicy::from(&config),
            cache: ResponseCache::new(),
            breaker: RateLimitBreaker::new(),
            queue: Mutex::new(queue),
            config,
        };
        Ok(Self {
            shared: Arc::new(shared),
        })
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.shared.config
    }

    /// Call `endpoint` and decode the envelope's `data` into `T`.
    ///
    /// `cache_ttl` applies only to cacheable requests (default method, no
    /// body); `None` means the configured default TTL.
    pub async fn call<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: RequestOptions,
        cache_ttl: Option<Duration>,
    ) -> Result<T, RequestError> {
        let value = self.call_value(endpoint, options, cache_ttl).await?;
        serde_json::from_value(value).map_err(|e| {
            let err = RequestError::InvalidResponse {
                reason: format!("Failed to decode {} payload: {}", endpoint, e),
            };
            tracing::error!(endpoint = %endpoint, error = %err, "Response payload mismatch");
            err
        })
    }

    /// Call `endpoint` and return the raw `data` payload.
    pub async fn call_value(
        &self,
        endpoint: &str,
        options: RequestOptions,
        cache_ttl: Option<Duration>,
    ) -> Result<Value, RequestError> {
        let cacheable = options.is_cacheable();
        let key = CacheKey::for_request(endpoint, &options);

        if cacheable {
            if let Some(data) = self.shared.cache.get(&key) {
                tracing::debug!(key = %key, "Cache hit");
                return Ok(data);
            }
            tracing::debug!(key = %key, "Cache miss");
        }

        let result = match self.enqueue(endpoint, options) {
            Ok(rx) => rx.await.unwrap_or(Err(RequestError::Dropped)),
            Err(e) => Err(e),
        };

        match result {
            Ok(data) => {
                if cacheable {
                    let ttl = cache_ttl.unwrap_or(self.shared.config.default_cache_ttl);
                    self.shared.cache.set(key, data.clone(), ttl);
                }
                Ok(data)
            }
            Err(e) => {
                if e.is_transient() {
                    tracing::warn!(endpoint = %endpoint, kind = e.kind(), error = %e, "Request refused");
                } else {
                    tracing::error!(endpoint = %endpoint, kind = e.kind(), error = %e, "Request failed");
                }
                Err(e)
            }
        }
    }

    /// Drop every cached response.
    pub fn clear_cache(&self) {
        self.shared.cache.clear();
        tracing::info!("Response cache cleared");
    }

    pub fn cache_info(&self) -> CacheInfo {
        self.shared.cache.info()
    }

    pub fn stats(&self) -> OrchestratorStats {
        let now = Instant::now();
        let (queue_len, drain_state) = {
            let queue = self.shared.lock_queue();
            (queue.len(), queue.drain_state())
        };
        OrchestratorStats {
            queue_len,
            drain_state,
            circuit_state: self.shared.breaker.state(now),
            consecutive_errors: self.shared.breaker.consecutive_errors(),
            rate_limited_for: self.shared.breaker.remaining(now),
        }
    }

    /// Probe the server's liveness endpoint, bypassing queue and cache.
    pub async fn health(&self) -> bool {
        self.shared.transport.health().await
    }

    /// Queue a job, starting the drain loop if none is running.
    fn enqueue(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<oneshot::Receiver<JobResult>, RequestError> {
        let (job, rx) = QueuedJob::new(endpoint, options);
        let method = job.options.method();

        let start_drain = {
            let mut queue = self.shared.lock_queue();
            let now = Instant::now();
            // Checked under the queue lock so a concurrent trip cannot miss this job.
            if self.shared.breaker.is_open(now) {
                return Err(RequestError::ServiceUnavailable {
                    retry_after: self.shared.breaker.remaining(now),
                });
            }
            if let Err((_job, err)) = queue.push(job) {
                return Err(err);
            }
            tracing::debug!(endpoint = %endpoint, method = %method, queue_len = queue.len(), "Request queued");
            queue.begin_drain()
        };

        if start_drain {
            tokio::spawn(drain(Arc::clone(&self.shared)));
        }
        Ok(rx)
    }
}

impl std::fmt::Debug for RequestOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestOrchestrator")
            .field("config", &self.shared.config)
            .field("cache", &self.shared.cache)
            .finish()
    }
}

// ============================================================================
// DRAIN LOOP
// ============================================================================

/// Single worker servicing the queue until it is empty or the breaker opens.
async fn drain(shared: Arc<Shared>) {
    let mut guard = DrainGuard {
        shared: Arc::clone(&shared),
        finished: false,
    };
    drain_loop(&shared).await;
    guard.finished = true;
}

async fn drain_loop(shared: &Shared) {
    loop {
        let step = {
            let mut queue = shared.lock_queue();
            let now = Instant::now();
            if shared.breaker.is_open(now) {
                queue.halt();
                tracing::debug!(queue_len = queue.len(), "Circuit open, drain halted");
                return;
            }
            queue.next_step(now)
        };

        match step {
            DrainStep::Idle => return,
            DrainStep::Wait(wait) => {
                tracing::debug!(wait_ms = log_millis(wait), "Pacing");
                tokio::time::sleep(wait).await;
            }
            DrainStep::Expired(job, waited) => {
                tracing::warn!(
                    endpoint = %job.endpoint,
                    waited_ms = log_millis(waited),
                    "Discarding stale request"
                );
                job.reject(RequestError::QueueTimeout { waited });
            }
            DrainStep::Dispatch(job) => {
                let result = shared.execute(&job.endpoint, &job.options).await;
                job.settle(result);
            }
        }
    }
}

/// Releases the queue when a drain task ends without reaching Idle.
///
/// That happens when the task panics or is dropped mid-flight. The job in
/// flight is dropped with the task, so its caller sees
/// [`RequestError::Dropped`]. Jobs still queued get a fresh drain task.
struct DrainGuard {
    shared: Arc<Shared>,
    finished: bool,
}

impl Drop for DrainGuard {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        let restart = {
            let mut queue = self.shared.lock_queue();
            queue.halt();
            !queue.is_empty() && queue.begin_drain()
        };
        tracing::error!(restart, "Drain task ended abnormally, queue released");
        if !restart {
            return;
        }
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(drain(Arc::clone(&self.shared)));
            }
            Err(_) => self.shared.lock_queue().halt(),
        }
    }
}

impl Shared {
    fn lock_queue(&self) -> MutexGuard<'_, RequestQueue> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// One dispatched job: the transport call plus any retries.
    async fn execute(&self, endpoint: &str, options: &RequestOptions) -> JobResult {
        let mut attempt = 0;
        loop {
            tracing::debug!(endpoint = %endpoint, method = %options.method(), attempt, "Sending request");
            match self.transport.send(endpoint, options).await {
                Ok(data) => {
                    self.breaker.record_success();
                    return Ok(data);
                }
                Err(RequestError::RateLimited { retry_after }) => {
                    tracing::warn!(
                        endpoint = %endpoint,
                        retry_after_ms = retry_after.map(log_millis),
                        "Remote API rate limit hit"
                    );
                    return Err(self.trip());
                }
                Err(e) if self.retry.should_retry(&e, attempt) => {
                    tracing::warn!(
                        endpoint = %endpoint,
                        status = e.status(),
                        attempt,
                        delay_ms = log_millis(self.retry.delay),
                        error = %e,
                        "Transport failure, retrying"
                    );
                    tokio::time::sleep(self.retry.delay).await;
                    if self.breaker.is_open(Instant::now()) {
                        return Err(e);
                    }
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Open the breaker and reject everything still queued.
    ///
    /// Returns the error for the job that triggered the trip.
    fn trip(&self) -> RequestError {
        let backoff = self.config.rate_limit_backoff;
        let rejected = {
            let mut queue = self.lock_queue();
            self.breaker.trip(Instant::now(), backoff);
            queue.take_all()
        };

        if !rejected.is_empty() {
            tracing::warn!(rejected = rejected.len(), "Rejecting queued requests after rate limit");
        }
        for job in rejected {
            job.reject(rate_limited(backoff));
        }
        rate_limited(backoff)
    }
}

fn rate_limited(backoff: Duration) -> RequestError {
    RequestError::RateLimited {
        retry_after: Some(backoff),
    }
}
