//! Orchestrator state enums.

use serde::{Deserialize, Serialize};

// ============================================================================
// CIRCUIT STATE
// ============================================================================

/// Rate-limit breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CircuitState {
    /// Requests flow normally
    #[default]
    Closed,
    /// Backoff window after a rate-limit response; all new work is refused
    Open,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Closed => "Closed",
            Self::Open => "Open",
        }
    }

    pub fn parse(s: &str) -> Result<Self, CircuitStateParseError> {
        match s {
            "Closed" => Ok(Self::Closed),
            "Open" => Ok(Self::Open),
            _ => Err(CircuitStateParseError(s.to_string())),
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }
}

/// Error parsing CircuitState from string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircuitStateParseError(pub String);

impl std::fmt::Display for CircuitStateParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid circuit state: {}", self.0)
    }
}

impl std::error::Error for CircuitStateParseError {}

// ============================================================================
// DRAIN STATE
// ============================================================================

/// Whether a drain loop currently owns the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DrainState {
    /// No drain loop running; the next enqueue starts one
    #[default]
    Idle,
    /// A drain loop is servicing the queue
    Draining,
}

impl DrainState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Draining => "Draining",
        }
    }
}
