//! Response envelope returned by every remote endpoint.

use crate::constants::DEFAULT_API_ERROR_MESSAGE;
use crate::error::RequestError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `{ success, data, error, details }` wrapper used by the dashboard API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiEnvelope<T = Value> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl<T> ApiEnvelope<T> {
    /// Successful envelope carrying `data`.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            details: None,
        }
    }

    /// Failed envelope carrying an error message.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            details: None,
        }
    }

    /// Attach a `details` string.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

impl ApiEnvelope<Value> {
    /// Unwrap the envelope into its payload.
    ///
    /// A missing `data` field on success becomes JSON `null`; a failed
    /// envelope becomes [`RequestError::Api`].
    pub fn into_data(self) -> Result<Value, RequestError> {
        if self.success {
            Ok(self.data.unwrap_or(Value::Null))
        } else {
            Err(RequestError::Api {
                message: self
                    .error
                    .unwrap_or_else(|| DEFAULT_API_ERROR_MESSAGE.to_string()),
                details: self.details,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_envelope_unwraps_data() {
        let envelope: ApiEnvelope =
            serde_json::from_value(json!({"success": true, "data": ["customers", "orders"]}))
                .unwrap();
        assert_eq!(envelope.into_data().unwrap(), json!(["customers", "orders"]));
    }

    #[test]
    fn test_success_without_data_is_null() {
        let envelope: ApiEnvelope =
            serde_json::from_value(json!({"success": true, "message": "Кэш очищен успешно"}))
                .unwrap();
        assert_eq!(envelope.into_data().unwrap(), Value::Null);
    }

    #[test]
    fn test_failed_envelope_becomes_api_error() {
        let envelope: ApiEnvelope = serde_json::from_value(json!({
            "success": false,
            "error": "Ошибка выполнения запроса",
            "details": "relation \"foo\" does not exist"
        }))
        .unwrap();
        let err = envelope.into_data().unwrap_err();
        assert_eq!(
            err,
            RequestError::Api {
                message: "Ошибка выполнения запроса".to_string(),
                details: Some("relation \"foo\" does not exist".to_string()),
            }
        );
    }

    #[test]
    fn test_failed_envelope_without_message_uses_default() {
        let envelope: ApiEnvelope = ApiEnvelope {
            success: false,
            data: None,
            error: None,
            details: None,
        };
        match envelope.into_data() {
            Err(RequestError::Api { message, .. }) => {
                assert_eq!(message, DEFAULT_API_ERROR_MESSAGE)
            }
            other => panic!("expected api error, got {:?}", other),
        }
    }

    #[test]
    fn test_constructors_serialize_sparse() {
        let value = serde_json::to_value(ApiEnvelope::ok(json!(1))).unwrap();
        assert_eq!(value, json!({"success": true, "data": 1}));

        let value =
            serde_json::to_value(ApiEnvelope::<Value>::failure("boom").with_details("trace"))
                .unwrap();
        assert_eq!(
            value,
            json!({"success": false, "error": "boom", "details": "trace"})
        );
    }
}
