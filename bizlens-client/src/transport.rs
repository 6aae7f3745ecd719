//! reqwest-backed transport

use async_trait::async_trait;
use bizlens_core::{ApiEnvelope, BizlensResult, ConfigError, Method, RequestError, RequestOptions, Transport};
use reqwest::header::HeaderMap;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;

/// HTTP client for the dashboard API.
///
/// Performs a single round trip per call and normalizes the response
/// envelope. Retry, caching and pacing live in the orchestrator.
pub struct HttpTransport {
    client: Client,
    base_url: String,
    health_url: String,
}

impl HttpTransport {
    /// Create a new transport.
    ///
    /// # Arguments
    /// * `base_url` - API root, e.g. `http://localhost:3001/api`
    /// * `timeout` - per-request timeout
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> BizlensResult<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(ConfigError::MissingRequired {
                field: "api_base_url".to_string(),
            }
            .into());
        }

        let client = Client::builder().timeout(timeout).build().map_err(|e| {
            ConfigError::InvalidValue {
                field: "http_client".to_string(),
                value: base_url.clone(),
                reason: e.to_string(),
            }
        })?;

        Ok(Self {
            health_url: health_url_for(&base_url),
            client,
            base_url,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn health_url(&self) -> &str {
        &self.health_url
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, endpoint: &str, options: &RequestOptions) -> Result<Value, RequestError> {
        let url = format!("{}{}", self.base_url, endpoint);
        let mut request = self
            .client
            .request(reqwest_method(options.method()), &url)
            .header("Content-Type", "application/json");
        for (name, value) in &options.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &options.body {
            request = request.body(body.clone());
        }

        let response = request.send().await.map_err(|e| RequestError::Transport {
            status: e.status().map(|s| s.as_u16()),
            message: format!("HTTP request failed: {}", e),
        })?;

        let status = response.status();
        let retry_after = parse_retry_after(response.headers());
        let body = response.text().await.map_err(|e| RequestError::Transport {
            status: Some(status.as_u16()),
            message: format!("Failed to read response body: {}", e),
        })?;

        normalize_response(status, retry_after, &body)
    }

    async fn health(&self) -> bool {
        match self.client.get(&self.health_url).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::warn!(url = %self.health_url, error = %e, "Health probe failed");
                false
            }
        }
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url)
            .field("health_url", &self.health_url)
            .finish()
    }
}

fn reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
    }
}

/// The liveness endpoint sits at the server origin, outside the `/api` prefix.
fn health_url_for(base_url: &str) -> String {
    let origin = base_url.strip_suffix("/api").unwrap_or(base_url);
    format!("{}/health", origin)
}

fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get("retry-after")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<f64>().ok())
        .and_then(|seconds| Duration::try_from_secs_f64(seconds).ok())
}

/// Map a status and raw body onto the envelope payload or a [`RequestError`].
pub(crate) fn normalize_response(
    status: StatusCode,
    retry_after: Option<Duration>,
    body: &str,
) -> Result<Value, RequestError> {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(RequestError::RateLimited { retry_after });
    }

    if !status.is_success() {
        let message = serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
            .unwrap_or_else(|| {
                format!(
                    "HTTP {}: {}",
                    status.as_u16(),
                    status.canonical_reason().unwrap_or("Unknown Status")
                )
            });
        return Err(RequestError::Transport {
            status: Some(status.as_u16()),
            message,
        });
    }

    let envelope: ApiEnvelope = serde_json::from_str(body).map_err(|e| {
        RequestError::InvalidResponse {
            reason: format!("Failed to parse response envelope: {}", e),
        }
    })?;
    envelope.into_data()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_envelope_returns_data() {
        let body = json!({"success": true, "data": ["customers", "orders"]}).to_string();
        let data = normalize_response(StatusCode::OK, None, &body).unwrap();
        assert_eq!(data, json!(["customers", "orders"]));
    }

    #[test]
    fn test_rate_limit_status_wins_over_body() {
        let err = normalize_response(
            StatusCode::TOO_MANY_REQUESTS,
            Some(Duration::from_secs(2)),
            "Too many requests, please try again later.",
        )
        .unwrap_err();
        assert_eq!(
            err,
            RequestError::RateLimited {
                retry_after: Some(Duration::from_secs(2))
            }
        );
    }

    #[test]
    fn test_error_status_uses_envelope_message() {
        let body = json!({"success": false, "error": "Ошибка выполнения запроса"}).to_string();
        let err = normalize_response(StatusCode::INTERNAL_SERVER_ERROR, None, &body).unwrap_err();
        assert_eq!(
            err,
            RequestError::Transport {
                status: Some(500),
                message: "Ошибка выполнения запроса".to_string(),
            }
        );
    }

    #[test]
    fn test_error_status_with_plain_body_synthesizes_message() {
        let err = normalize_response(StatusCode::BAD_GATEWAY, None, "<html>bad gateway</html>")
            .unwrap_err();
        assert_eq!(
            err,
            RequestError::Transport {
                status: Some(502),
                message: "HTTP 502: Bad Gateway".to_string(),
            }
        );
    }

    #[test]
    fn test_unsuccessful_envelope_on_2xx_is_api_error() {
        let body = json!({"success": false, "error": "nope", "details": "why"}).to_string();
        let err = normalize_response(StatusCode::OK, None, &body).unwrap_err();
        assert!(matches!(err, RequestError::Api { ref message, .. } if message == "nope"));
    }

    #[test]
    fn test_non_envelope_2xx_is_invalid_response() {
        let err = normalize_response(StatusCode::OK, None, "[1,2,3]").unwrap_err();
        assert!(matches!(err, RequestError::InvalidResponse { .. }));
    }

    #[test]
    fn test_health_url_strips_api_prefix() {
        assert_eq!(
            health_url_for("http://localhost:3001/api"),
            "http://localhost:3001/health"
        );
        assert_eq!(
            health_url_for("https://bi.example.com"),
            "https://bi.example.com/health"
        );
    }

    #[test]
    fn test_parse_retry_after_seconds() {
        let mut headers = HeaderMap::new();
        headers.insert("retry-after", "1.5".parse().unwrap());
        assert_eq!(parse_retry_after(&headers), Some(Duration::from_millis(1500)));

        headers.insert("retry-after", "Wed, 21 Oct 2015 07:28:00 GMT".parse().unwrap());
        assert_eq!(parse_retry_after(&headers), None);
    }

    #[test]
    fn test_parse_retry_after_out_of_range() {
        let mut headers = HeaderMap::new();
        for raw in ["1e30", "-5", "NaN", "inf"] {
            headers.insert("retry-after", raw.parse().unwrap());
            assert_eq!(parse_retry_after(&headers), None, "{}", raw);
        }
    }

    #[test]
    fn test_new_trims_trailing_slash() {
        let transport = HttpTransport::new("http://localhost:3001/api/", Duration::from_secs(5)).unwrap();
        assert_eq!(transport.base_url(), "http://localhost:3001/api");
        assert_eq!(transport.health_url(), "http://localhost:3001/health");
    }

    #[test]
    fn test_new_rejects_empty_base_url() {
        assert!(HttpTransport::new("", Duration::from_secs(5)).is_err());
    }
}
