//! Maps domain errors onto HTTP responses.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use jimpitan_core::ServiceError;
use jimpitan_core::bulk::BulkOutcome;
use jimpitan_shared::{ApiResponse, AppError};
use tracing::error;

/// Error returned by handlers and extractors.
///
/// Renders as the standard envelope with `status: "error"`. A bulk request in
/// which every item failed carries the per-item failures in `data`.
#[derive(Debug)]
pub struct ApiError {
    error: AppError,
    details: Option<BulkOutcome>,
}

impl ApiError {
    /// HTTP status of this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// A `400` for a missing or malformed request parameter.
    pub fn bad_request(message: impl Into<String>) -> Self {
        AppError::Validation(message.into()).into()
    }
}

impl From<AppError> for ApiError {
    fn from(error: AppError) -> Self {
        Self {
            error,
            details: None,
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        let details = match &err {
            ServiceError::AllFailed(failures) => Some(BulkOutcome {
                succeeded: 0,
                failures: failures.clone(),
            }),
            _ => None,
        };
        Self {
            error: err.into(),
            details,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(code = self.error.error_code(), error = %self.error, "Request failed");
        }

        let message = self.error.public_message();
        match self.details {
            Some(outcome) => (status, Json(ApiResponse::error_with(message, outcome))).into_response(),
            None => (status, Json(ApiResponse::error(message))).into_response(),
        }
    }
}

/// Unwraps a required query parameter.
///
/// # Errors
///
/// Returns a `400` naming the parameter when it is absent or blank.
pub fn required(value: Option<String>, name: &str) -> Result<String, ApiError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::bad_request(format!("{name} is required")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use jimpitan_core::bulk::BulkFailure;
    use rstest::rstest;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[rstest]
    #[case(ServiceError::Validation("x".into()), StatusCode::BAD_REQUEST)]
    #[case(ServiceError::InvalidCredentials, StatusCode::UNAUTHORIZED)]
    #[case(ServiceError::TokenExpired, StatusCode::UNAUTHORIZED)]
    #[case(ServiceError::Forbidden("x".into()), StatusCode::FORBIDDEN)]
    #[case(ServiceError::NotFound("x".into()), StatusCode::NOT_FOUND)]
    #[case(ServiceError::Conflict("x".into()), StatusCode::CONFLICT)]
    #[case(ServiceError::Storage("x".into()), StatusCode::INTERNAL_SERVER_ERROR)]
    fn test_status_mapping(#[case] err: ServiceError, #[case] status: StatusCode) {
        assert_eq!(ApiError::from(err).status(), status);
    }

    #[tokio::test]
    async fn test_all_failed_carries_failures() {
        let err = ServiceError::AllFailed(vec![BulkFailure {
            id: "0009".to_string(),
            reason: "transaction 0009 not found".to_string(),
        }]);

        let response = ApiError::from(err).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = body_json(response).await;
        assert_eq!(body["status"], "error");
        assert_eq!(body["data"]["succeeded"], 0);
        assert_eq!(body["data"]["failures"][0]["id"], "0009");
    }

    #[tokio::test]
    async fn test_storage_detail_is_not_leaked() {
        let response = ApiError::from(ServiceError::Storage("connection reset".into())).into_response();

        let body = body_json(response).await;
        assert!(!body["message"].as_str().unwrap().contains("connection reset"));
        assert!(body.get("data").is_none());
    }

    #[test]
    fn test_required_param() {
        assert_eq!(required(Some(" CUST-001 ".into()), "id").unwrap(), "CUST-001");
        assert_eq!(
            required(Some("  ".into()), "id").unwrap_err().status(),
            StatusCode::BAD_REQUEST
        );
        assert!(required(None, "id").is_err());
    }
}
