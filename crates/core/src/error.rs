//! Error taxonomy for the core services.
//!
//! Every service operation returns `ServiceError`. The HTTP boundary maps each
//! variant to a status code through [`ServiceError::http_status_code`] or by
//! converting into [`AppError`].

use jimpitan_shared::AppError;
use thiserror::Error;

use crate::bulk::BulkFailure;
use crate::store::StoreError;

/// Errors that can occur during service operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    // ========== Input Errors ==========
    /// Missing or malformed input.
    #[error("{0}")]
    Validation(String),

    /// The referenced record does not exist (or was soft-deleted).
    #[error("{0}")]
    NotFound(String),

    /// The caller may not perform this operation.
    #[error("{0}")]
    Forbidden(String),

    /// A uniqueness rule was violated.
    #[error("{0}")]
    Conflict(String),

    // ========== Authentication Errors ==========
    /// Unknown username or wrong password.
    #[error("invalid username or password")]
    InvalidCredentials,

    /// No token was presented.
    #[error("token is required")]
    MissingToken,

    /// Token is malformed, forged or no longer the user's current session.
    #[error("invalid token")]
    InvalidToken,

    /// Token is past its expiry.
    #[error("token has expired")]
    TokenExpired,

    // ========== Batch Errors ==========
    /// A non-empty batch in which no item succeeded.
    #[error("all {} items failed", .0.len())]
    AllFailed(Vec<BulkFailure>),

    // ========== Infrastructure Errors ==========
    /// Storage failure.
    #[error("storage error: {0}")]
    Storage(String),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::Conflict(_) => "CONFLICT",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::MissingToken => "MISSING_TOKEN",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::AllFailed(_) => "ALL_FAILED",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::InvalidCredentials
            | Self::MissingToken
            | Self::InvalidToken
            | Self::TokenExpired => 401,
            Self::Forbidden(_) => 403,
            Self::NotFound(_) => 404,
            Self::Conflict(_) => 409,
            Self::AllFailed(_) => 422,
            Self::Storage(_) | Self::Internal(_) => 500,
        }
    }

    pub(crate) fn not_found(what: &str, id: &str) -> Self {
        Self::NotFound(format!("{what} {id} not found"))
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(msg) => Self::Conflict(msg),
            StoreError::Backend(msg) => Self::Storage(msg),
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        let message = err.to_string();
        match err {
            ServiceError::Validation(_) => Self::Validation(message),
            ServiceError::NotFound(_) => Self::NotFound(message),
            ServiceError::Forbidden(_) => Self::Forbidden(message),
            ServiceError::Conflict(_) => Self::Conflict(message),
            ServiceError::InvalidCredentials
            | ServiceError::MissingToken
            | ServiceError::InvalidToken
            | ServiceError::TokenExpired => Self::Unauthorized(message),
            ServiceError::AllFailed(_) => Self::BusinessRule(message),
            ServiceError::Storage(_) => Self::Database(message),
            ServiceError::Internal(_) => Self::Internal(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ServiceError::Validation("x".into()), 400)]
    #[case(ServiceError::InvalidCredentials, 401)]
    #[case(ServiceError::MissingToken, 401)]
    #[case(ServiceError::InvalidToken, 401)]
    #[case(ServiceError::TokenExpired, 401)]
    #[case(ServiceError::Forbidden("x".into()), 403)]
    #[case(ServiceError::NotFound("x".into()), 404)]
    #[case(ServiceError::Conflict("x".into()), 409)]
    #[case(ServiceError::AllFailed(vec![]), 422)]
    #[case(ServiceError::Storage("x".into()), 500)]
    fn test_status_matches_app_error(#[case] err: ServiceError, #[case] status: u16) {
        assert_eq!(err.http_status_code(), status);
        assert_eq!(AppError::from(err).status_code(), status);
    }

    #[test]
    fn test_store_conflict_maps_to_conflict() {
        let err: ServiceError = StoreError::Conflict("username taken".into()).into();
        assert_eq!(err.error_code(), "CONFLICT");
    }

    #[test]
    fn test_all_failed_message_counts_items() {
        let err = ServiceError::AllFailed(vec![
            BulkFailure {
                id: "0001".into(),
                reason: "transaction 0001 not found".into(),
            },
            BulkFailure {
                id: "0002".into(),
                reason: "transaction 0002 not found".into(),
            },
        ]);
        assert_eq!(err.to_string(), "all 2 items failed");
    }
}
