//! FIFO request queue with pacing and staleness

use bizlens_core::{DrainState, RequestError, RequestOptions};
use serde_json::Value;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::Instant;
use uuid::Uuid;

/// Outcome delivered to the caller awaiting a job.
pub type JobResult = Result<Value, RequestError>;

// ============================================================================
// QUEUED JOB
// ============================================================================

/// A submitted request waiting for its turn on the network.
#[derive(Debug)]
pub struct QueuedJob {
    pub id: Uuid,
    pub endpoint: String,
    pub options: RequestOptions,
    pub enqueued_at: Instant,
    completion: oneshot::Sender<JobResult>,
}

impl QueuedJob {
    /// Create a job and the receiver its caller awaits.
    pub fn new(
        endpoint: impl Into<String>,
        options: RequestOptions,
    ) -> (Self, oneshot::Receiver<JobResult>) {
        let (tx, rx) = oneshot::channel();
        let job = Self {
            id: Uuid::now_v7(),
            endpoint: endpoint.into(),
            options,
            enqueued_at: Instant::now(),
            completion: tx,
        };
        (job, rx)
    }

    /// Deliver the outcome. A caller that stopped waiting is ignored.
    pub fn settle(self, result: JobResult) {
        if self.completion.send(result).is_err() {
            tracing::debug!(job_id = %self.id, endpoint = %self.endpoint, "Caller dropped before settlement");
        }
    }

    pub fn reject(self, error: RequestError) {
        self.settle(Err(error));
    }

    /// Time spent in the queue as of `now`.
    pub fn waited(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.enqueued_at)
    }
}

// ============================================================================
// DRAIN STEP
// ============================================================================

/// What the drain loop should do next.
#[derive(Debug)]
pub enum DrainStep {
    /// Queue empty; the drain state is now Idle.
    Idle,
    /// Pacing window not yet elapsed; sleep this long and re-check.
    Wait(Duration),
    /// Head job was too old; reject it without consuming a pacing slot.
    Expired(QueuedJob, Duration),
    /// Head job is due; `last_request_at` has been stamped.
    Dispatch(QueuedJob),
}

// ============================================================================
// REQUEST QUEUE
// ============================================================================

/// Bounded FIFO of pending jobs plus the drain state machine.
///
/// Not synchronized by itself; the orchestrator keeps it behind one mutex so
/// the pop of a job and the update of `last_request_at` are a single step.
#[derive(Debug)]
pub struct RequestQueue {
    jobs: VecDeque<QueuedJob>,
    drain: DrainState,
    last_request_at: Option<Instant>,
    capacity: usize,
    min_interval: Duration,
    stale_threshold: Duration,
}

impl RequestQueue {
    pub fn new(capacity: usize, min_interval: Duration, stale_threshold: Duration) -> Self {
        Self {
            jobs: VecDeque::with_capacity(capacity.min(64)),
            drain: DrainState::Idle,
            last_request_at: None,
            capacity,
            min_interval,
            stale_threshold,
        }
    }

    /// Append a job, failing fast when the queue is at capacity.
    ///
    /// On failure the job is handed back so the caller can reject it.
    pub fn push(&mut self, job: QueuedJob) -> Result<(), (QueuedJob, RequestError)> {
        if self.jobs.len() >= self.capacity {
            let err = RequestError::QueueFull {
                capacity: self.capacity,
            };
            return Err((job, err));
        }
        self.jobs.push_back(job);
        Ok(())
    }

    /// Claim the drain loop. Returns true if the caller must start it.
    pub fn begin_drain(&mut self) -> bool {
        match self.drain {
            DrainState::Idle => {
                self.drain = DrainState::Draining;
                true
            }
            DrainState::Draining => false,
        }
    }

    /// Stop draining, leaving queued jobs in place.
    pub fn halt(&mut self) {
        self.drain = DrainState::Idle;
    }

    /// Decide the next drain action at `now`.
    pub fn next_step(&mut self, now: Instant) -> DrainStep {
        if self.jobs.is_empty() {
            self.drain = DrainState::Idle;
            return DrainStep::Idle;
        }

        if let Some(last) = self.last_request_at {
            let elapsed = now.saturating_duration_since(last);
            if elapsed < self.min_interval {
                return DrainStep::Wait(self.min_interval - elapsed);
            }
        }

        let Some(job) = self.jobs.pop_front() else {
            self.drain = DrainState::Idle;
            return DrainStep::Idle;
        };

        let waited = job.waited(now);
        if waited > self.stale_threshold {
            return DrainStep::Expired(job, waited);
        }

        self.last_request_at = Some(now);
        DrainStep::Dispatch(job)
    }

    /// Remove every queued job, in FIFO order.
    pub fn take_all(&mut self) -> Vec<QueuedJob> {
        self.jobs.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn drain_state(&self) -> DrainState {
        self.drain
    }

    pub fn last_request_at(&self) -> Option<Instant> {
        self.last_request_at
    }
}
