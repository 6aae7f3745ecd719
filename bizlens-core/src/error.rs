//! Error types for BizLens operations

use std::time::Duration;
use thiserror::Error;

/// Failures surfaced by the request orchestrator and the transport.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("Transport failure{}: {message}", status_suffix(.status))]
    Transport { status: Option<u16>, message: String },

    #[error("API error: {message}")]
    Api {
        message: String,
        details: Option<String>,
    },

    #[error("Rate limited by remote API{}", retry_after_suffix(.retry_after))]
    RateLimited { retry_after: Option<Duration> },

    #[error("Service unavailable, retry after {}ms", .retry_after.as_millis())]
    ServiceUnavailable { retry_after: Duration },

    #[error("Request queue is full (capacity {capacity})")]
    QueueFull { capacity: usize },

    #[error("Request expired in queue after {}ms", .waited.as_millis())]
    QueueTimeout { waited: Duration },

    #[error("Invalid response: {reason}")]
    InvalidResponse { reason: String },

    #[error("Request dropped before completion")]
    Dropped,
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {})", s)).unwrap_or_default()
}

fn retry_after_suffix(retry_after: &Option<Duration>) -> String {
    retry_after
        .map(|d| format!(", retry after {}ms", d.as_millis()))
        .unwrap_or_default()
}

impl RequestError {
    /// True for failures that say "try again later" rather than "this
    /// request is wrong".
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. }
                | Self::ServiceUnavailable { .. }
                | Self::QueueFull { .. }
                | Self::QueueTimeout { .. }
        )
    }

    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport { status, .. } => *status,
            Self::RateLimited { .. } => Some(429),
            _ => None,
        }
    }

    /// Short, stable label for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport { .. } => "transport",
            Self::Api { .. } => "api",
            Self::RateLimited { .. } => "rate_limited",
            Self::ServiceUnavailable { .. } => "service_unavailable",
            Self::QueueFull { .. } => "queue_full",
            Self::QueueTimeout { .. } => "queue_timeout",
            Self::InvalidResponse { .. } => "invalid_response",
            Self::Dropped => "dropped",
        }
    }
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Master error type for all BizLens errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BizlensError {
    #[error("Request error: {0}")]
    Request(#[from] RequestError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

impl BizlensError {
    /// The request error inside, if this is one.
    pub fn as_request(&self) -> Option<&RequestError> {
        match self {
            Self::Request(err) => Some(err),
            Self::Config(_) => None,
        }
    }
}

/// Result type alias for BizLens operations.
pub type BizlensResult<T> = Result<T, BizlensError>;

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_display_with_status() {
        let err = RequestError::Transport {
            status: Some(500),
            message: "Ошибка выполнения запроса".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("HTTP 500"));
        assert!(msg.contains("Ошибка выполнения запроса"));
    }

    #[test]
    fn test_transport_error_display_without_status() {
        let err = RequestError::Transport {
            status: None,
            message: "connection refused".to_string(),
        };
        let msg = format!("{}", err);
        assert!(!msg.contains("HTTP"));
        assert!(msg.contains("connection refused"));
    }

    #[test]
    fn test_rate_limited_display() {
        let err = RequestError::RateLimited {
            retry_after: Some(Duration::from_millis(1500)),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("Rate limited"));
        assert!(msg.contains("1500"));
    }

    #[test]
    fn test_transient_classification() {
        assert!(RequestError::RateLimited { retry_after: None }.is_transient());
        assert!(RequestError::ServiceUnavailable {
            retry_after: Duration::from_secs(1)
        }
        .is_transient());
        assert!(RequestError::QueueFull { capacity: 5 }.is_transient());
        assert!(RequestError::QueueTimeout {
            waited: Duration::from_secs(31)
        }
        .is_transient());

        assert!(!RequestError::Api {
            message: "bad".to_string(),
            details: None
        }
        .is_transient());
        assert!(!RequestError::Transport {
            status: Some(500),
            message: "boom".to_string()
        }
        .is_transient());
    }

    #[test]
    fn test_status_extraction() {
        assert_eq!(RequestError::RateLimited { retry_after: None }.status(), Some(429));
        assert_eq!(
            RequestError::Transport {
                status: Some(502),
                message: String::new()
            }
            .status(),
            Some(502)
        );
        assert_eq!(RequestError::Dropped.status(), None);
    }

    #[test]
    fn test_bizlens_error_from_variants() {
        let request = BizlensError::from(RequestError::Dropped);
        assert!(matches!(request, BizlensError::Request(_)));
        assert_eq!(request.as_request(), Some(&RequestError::Dropped));

        let config = BizlensError::from(ConfigError::MissingRequired {
            field: "api_base_url".to_string(),
        });
        assert!(matches!(config, BizlensError::Config(_)));
        assert!(config.as_request().is_none());
    }

    #[test]
    fn test_config_error_display_invalid_value() {
        let err = ConfigError::InvalidValue {
            field: "max_queue_size".to_string(),
            value: "0".to_string(),
            reason: "must be greater than 0".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("max_queue_size"));
        assert!(msg.contains("must be greater than 0"));
    }
}
