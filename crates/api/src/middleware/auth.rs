//! Authentication middleware for protected routes.

use axum::{
    extract::{FromRequestParts, Query, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use jimpitan_core::ServiceError;
use jimpitan_core::auth::Identity;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::AppState;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

/// Extracts the bearer token from the Authorization header.
fn extract_bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
}

/// Token from `Authorization: Bearer`, falling back to `?token=`.
fn request_token(request: &Request) -> Option<String> {
    let from_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(extract_bearer_token)
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(token) = from_header {
        return Some(token.to_string());
    }

    Query::<TokenQuery>::try_from_uri(request.uri())
        .ok()
        .and_then(|Query(q)| q.token)
        .filter(|t| !t.trim().is_empty())
}

/// Authentication middleware that validates session tokens.
///
/// The token must verify against the persisted session, so a logout or a
/// newer login rejects it. On success the caller's [`Identity`] is stored in
/// request extensions.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = request_token(&request) else {
        debug!(path = %request.uri().path(), "Request without token");
        return ApiError::from(ServiceError::MissingToken).into_response();
    };

    match state.auth.verify(&token).await {
        Ok(session) => {
            request.extensions_mut().insert(session.identity());
            next.run(request).await
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// Extractor for the authenticated caller.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Identity);

impl AuthUser {
    /// Returns the caller's user ID.
    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.0.user_id
    }

    /// Returns the caller's identity.
    #[must_use]
    pub const fn identity(&self) -> &Identity {
        &self.0
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .map(AuthUser)
            .ok_or_else(|| ServiceError::MissingToken.into())
    }
}

/// Extractor for an authenticated administrator. Operators get `403`.
#[derive(Debug, Clone)]
pub struct AdminUser(pub Identity);

impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthUser(identity) = AuthUser::from_request_parts(parts, state).await?;
        if !identity.role.is_admin() {
            warn!(user_id = %identity.user_id, path = %parts.uri.path(), "Admin route refused");
            return Err(ServiceError::Forbidden("admin access required".to_string()).into());
        }
        Ok(Self(identity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(extract_bearer_token("bearer abc"), Some("abc"));
        assert_eq!(extract_bearer_token("Basic abc"), None);
    }

    #[test]
    fn test_request_token_prefers_header() {
        let request = Request::builder()
            .uri("/api/transactions?token=from-query")
            .header(AUTHORIZATION, "Bearer from-header")
            .body(Body::empty())
            .unwrap();

        assert_eq!(request_token(&request).as_deref(), Some("from-header"));
    }

    #[test]
    fn test_request_token_from_query() {
        let request = Request::builder()
            .uri("/api/customers/qr?qr_hash=abc&token=from-query")
            .body(Body::empty())
            .unwrap();
        assert_eq!(request_token(&request).as_deref(), Some("from-query"));

        let bare = Request::builder()
            .uri("/api/customers?token=")
            .body(Body::empty())
            .unwrap();
        assert_eq!(request_token(&bare), None);
    }
}
