//! Health check endpoints.

use axum::{Json, Router, routing::get};
use jimpitan_shared::ApiResponse;
use serde::Serialize;

use crate::AppState;

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: &'static str,
    /// Service version.
    pub version: &'static str,
}

/// Health check handler.
async fn health_check() -> Json<ApiResponse<HealthResponse>> {
    Json(ApiResponse::success(
        "Jimpitan API is running",
        HealthResponse {
            status: "healthy",
            version: env!("CARGO_PKG_VERSION"),
        },
    ))
}

/// Creates health check routes under `/api`.
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

/// Serves the same check at `/`.
pub fn root_routes() -> Router<AppState> {
    Router::new().route("/", get(health_check))
}
