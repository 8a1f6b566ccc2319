//! JSON response envelope.
//!
//! Every API response has the shape `{"status": "success"|"error", "message": ..., "data": ...}`
//! with `data` omitted when there is nothing to return.

use serde::Serialize;

/// Outcome marker of an API response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    /// The request succeeded.
    Success,
    /// The request failed.
    Error,
}

/// Response envelope.
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T: Serialize> {
    /// Outcome marker.
    pub status: ResponseStatus,
    /// Human-readable message.
    pub message: String,
    /// Payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Successful response carrying a payload.
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            status: ResponseStatus::Success,
            message: message.into(),
            data: Some(data),
        }
    }

    /// Error response with details attached.
    pub fn error_with(message: impl Into<String>, data: T) -> Self {
        Self {
            status: ResponseStatus::Error,
            message: message.into(),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    /// Successful response without a payload.
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Success,
            message: message.into(),
            data: None,
        }
    }

    /// Error response without a payload.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Error,
            message: message.into(),
            data: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_envelope() {
        let body = serde_json::to_value(ApiResponse::success("ok", json!({"id": "0001"}))).unwrap();
        assert_eq!(
            body,
            json!({"status": "success", "message": "ok", "data": {"id": "0001"}})
        );
    }

    #[test]
    fn test_error_envelope_omits_data() {
        let body = serde_json::to_value(ApiResponse::error("nope")).unwrap();
        assert_eq!(body, json!({"status": "error", "message": "nope"}));
    }
}
