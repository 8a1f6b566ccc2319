//! Authentication routes for login, token verification and logout.

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::{get, post},
};
use jimpitan_core::auth::AuthSession;
use jimpitan_shared::ApiResponse;
use serde::Deserialize;

use crate::{AppState, error::ApiError, extract::AppJson, middleware::AuthUser};

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Login name.
    #[serde(default)]
    pub username: String,
    /// Plaintext password.
    #[serde(default)]
    pub password: String,
}

/// Query for `GET /verifyToken`.
#[derive(Debug, Deserialize)]
pub struct VerifyQuery {
    /// Token to check.
    pub token: Option<String>,
}

/// Creates the public auth routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/verifyToken", get(verify_token))
}

/// Creates the auth routes that need a session.
pub fn protected_routes() -> Router<AppState> {
    Router::new().route("/logout", post(logout))
}

/// POST /login - Authenticate and open a session.
async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<ApiResponse<AuthSession>>, ApiError> {
    let session = state
        .auth
        .authenticate(&payload.username, &payload.password)
        .await?;

    Ok(Json(ApiResponse::success("Login successful", session)))
}

/// GET /verifyToken - Check a token against the persisted session.
async fn verify_token(
    State(state): State<AppState>,
    Query(query): Query<VerifyQuery>,
) -> Result<Json<ApiResponse<AuthSession>>, ApiError> {
    let token = query.token.unwrap_or_default();
    let session = state.auth.verify(token.trim()).await?;

    Ok(Json(ApiResponse::success("Token is valid", session)))
}

/// POST /logout - End the caller's session.
async fn logout(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    state.auth.invalidate(user.user_id()).await?;

    Ok(Json(ApiResponse::ok("Logout successful")))
}
