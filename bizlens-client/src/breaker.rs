//! Rate-limit circuit breaker

use crate::log_millis;
use bizlens_core::constants::MAX_WINDOW_MS;
use bizlens_core::CircuitState;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Default)]
struct BreakerState {
    rate_limited_until: Option<Instant>,
    consecutive_errors: u32,
}

/// Timer-only breaker opened by rate-limit responses.
///
/// Open while `now < rate_limited_until`; closes on its own once the
/// backoff window has passed. There is no half-open probing.
#[derive(Debug, Default)]
pub struct RateLimitBreaker {
    state: Mutex<BreakerState>,
}

impl RateLimitBreaker {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BreakerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// True while the backoff window is active. Clears an elapsed window.
    pub fn is_open(&self, now: Instant) -> bool {
        let mut state = self.lock();
        match state.rate_limited_until {
            Some(until) if now < until => true,
            Some(_) => {
                state.rate_limited_until = None;
                tracing::info!("Rate-limit backoff elapsed, circuit closed");
                false
            }
            None => false,
        }
    }

    /// Time left in the backoff window, zero when closed.
    pub fn remaining(&self, now: Instant) -> Duration {
        self.lock()
            .rate_limited_until
            .map(|until| until.saturating_duration_since(now))
            .unwrap_or_default()
    }

    pub fn state(&self, now: Instant) -> CircuitState {
        if self.is_open(now) {
            CircuitState::Open
        } else {
            CircuitState::Closed
        }
    }

    /// Open the breaker for `backoff` starting at `now`.
    ///
    /// A window past the clock's range is capped at [`MAX_WINDOW_MS`].
    pub fn trip(&self, now: Instant, backoff: Duration) {
        let mut state = self.lock();
        let until = now
            .checked_add(backoff)
            .or_else(|| now.checked_add(Duration::from_millis(MAX_WINDOW_MS)))
            .unwrap_or(now);
        state.rate_limited_until = Some(until);
        state.consecutive_errors = state.consecutive_errors.saturating_add(1);
        tracing::info!(
            backoff_ms = log_millis(backoff),
            consecutive_errors = state.consecutive_errors,
            "Rate limited, circuit opened"
        );
    }

    /// Reset the consecutive error count after a successful call.
    pub fn record_success(&self) {
        self.lock().consecutive_errors = 0;
    }

    pub fn consecutive_errors(&self) -> u32 {
        self.lock().consecutive_errors
    }
}
