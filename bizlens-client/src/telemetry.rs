//! Tracing subscriber setup

use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "info";

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Plain,
    /// One JSON object per event
    Json,
}

impl LogFormat {
    /// Parse a format name; anything other than `json` is plain.
    pub fn parse(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Plain
        }
    }
}

/// Telemetry configuration from environment variables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TelemetryConfig {
    pub format: LogFormat,
}

impl TelemetryConfig {
    /// # Environment Variables
    /// - `BIZLENS_LOG_FORMAT`: `json` or `plain` (default: plain)
    ///
    /// Filtering follows `RUST_LOG`, defaulting to `info`.
    pub fn from_env() -> Self {
        Self {
            format: std::env::var("BIZLENS_LOG_FORMAT")
                .map(|s| LogFormat::parse(&s))
                .unwrap_or_default(),
        }
    }
}

/// Install the global tracing subscriber.
///
/// Call once at startup. Fails if a subscriber is already installed.
pub fn init_tracing(config: &TelemetryConfig) -> Result<(), TryInitError> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let json = config.format == LogFormat::Json;

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(|| tracing_subscriber::fmt::layer()))
        .try_init()?;

    tracing::debug!(format = ?config.format, "Tracing initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parse() {
        assert_eq!(LogFormat::parse("json"), LogFormat::Json);
        assert_eq!(LogFormat::parse(" JSON "), LogFormat::Json);
        assert_eq!(LogFormat::parse("plain"), LogFormat::Plain);
        assert_eq!(LogFormat::parse("whatever"), LogFormat::Plain);
    }

    #[test]
    fn test_default_is_plain() {
        assert_eq!(TelemetryConfig::default().format, LogFormat::Plain);
    }
}
