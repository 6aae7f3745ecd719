//! Request options and cache keys.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

// ============================================================================
// METHOD
// ============================================================================

/// HTTP method of a request. `Get` is the implicit default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    /// Uppercase wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }

    /// Parse a method name, case-insensitively.
    pub fn parse(s: &str) -> Result<Self, MethodParseError> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            _ => Err(MethodParseError(s.to_string())),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error parsing Method from string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodParseError(pub String);

impl fmt::Display for MethodParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid http method: {}", self.0)
    }
}

impl std::error::Error for MethodParseError {}

// ============================================================================
// REQUEST OPTIONS
// ============================================================================

/// Fetch-style request options: method override, raw body, extra headers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestOptions {
    /// Method override. `None` means a plain GET.
    pub method: Option<Method>,
    /// Raw request body, already serialized.
    pub body: Option<String>,
    /// Extra headers sent after `Content-Type`.
    pub headers: Vec<(String, String)>,
}

impl RequestOptions {
    /// Plain GET, no body.
    pub fn get() -> Self {
        Self::default()
    }

    /// POST with no body yet.
    pub fn post() -> Self {
        Self::with_method(Method::Post)
    }

    /// Options with an explicit method.
    pub fn with_method(method: Method) -> Self {
        Self {
            method: Some(method),
            ..Self::default()
        }
    }

    /// Set a raw body.
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serialize `value` as the JSON body.
    pub fn json_body<T: Serialize + ?Sized>(self, value: &T) -> Result<Self, serde_json::Error> {
        let body = serde_json::to_string(value)?;
        Ok(self.body(body))
    }

    /// Append a header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Effective method.
    pub fn method(&self) -> Method {
        self.method.unwrap_or_default()
    }

    /// Read-style request eligible for memoization: default GET and no body.
    pub fn is_cacheable(&self) -> bool {
        self.method() == Method::Get && self.body.is_none()
    }
}

// ============================================================================
// CACHE KEY
// ============================================================================

/// Deterministic key for `(method, endpoint, body)`.
///
/// Rendered as `"GET /database/tables"`; a body adds `#` plus the first 16
/// hex characters of its SHA-256 digest.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(method: Method, endpoint: &str, body: Option<&str>) -> Self {
        let mut key = format!("{} {}", method.as_str(), endpoint);
        if let Some(body) = body {
            let digest = Sha256::digest(body.as_bytes());
            key.push('#');
            key.push_str(&hex::encode(&digest[..8]));
        }
        Self(key)
    }

    /// Key for an endpoint called with `options`.
    pub fn for_request(endpoint: &str, options: &RequestOptions) -> Self {
        Self::new(options.method(), endpoint, options.body.as_deref())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_method_parse_roundtrip() {
        for method in [
            Method::Get,
            Method::Post,
            Method::Put,
            Method::Patch,
            Method::Delete,
        ] {
            assert_eq!(Method::parse(method.as_str()).unwrap(), method);
        }
        assert_eq!(Method::parse("post").unwrap(), Method::Post);
        assert!(Method::parse("TRACE").is_err());
    }

    #[test]
    fn test_default_options_are_cacheable() {
        assert!(RequestOptions::get().is_cacheable());
        assert!(RequestOptions::with_method(Method::Get).is_cacheable());
    }

    #[test]
    fn test_body_or_method_override_disables_caching() {
        assert!(!RequestOptions::post().is_cacheable());
        assert!(!RequestOptions::get().body("{}").is_cacheable());
        assert!(!RequestOptions::with_method(Method::Delete).is_cacheable());
    }

    #[test]
    fn test_json_body_serializes() {
        let options = RequestOptions::post()
            .json_body(&json!({"query": "SELECT 1"}))
            .unwrap();
        assert_eq!(options.body.as_deref(), Some(r#"{"query":"SELECT 1"}"#));
        assert_eq!(options.method(), Method::Post);
    }

    #[test]
    fn test_cache_key_without_body_is_readable() {
        let key = CacheKey::new(Method::Get, "/database/tables", None);
        assert_eq!(key.as_str(), "GET /database/tables");
    }

    #[test]
    fn test_cache_key_distinguishes_bodies() {
        let a = CacheKey::new(Method::Post, "/database/query", Some("SELECT 1"));
        let b = CacheKey::new(Method::Post, "/database/query", Some("SELECT 2"));
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("POST /database/query#"));
        assert_eq!(a.as_str().len(), "POST /database/query#".len() + 16);
    }

    #[test]
    fn test_cache_key_for_request_matches_new() {
        let options = RequestOptions::post().body("x");
        assert_eq!(
            CacheKey::for_request("/a", &options),
            CacheKey::new(Method::Post, "/a", Some("x"))
        );
    }
}
