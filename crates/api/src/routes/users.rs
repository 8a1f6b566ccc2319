//! Staff account routes.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
};
use jimpitan_core::bulk::BulkOutcome;
use jimpitan_core::transaction::Transaction;
use jimpitan_core::user::{CreateUserInput, UpdateUserInput, User};
use jimpitan_shared::ApiResponse;
use serde::Deserialize;

use crate::{
    AppState,
    error::{ApiError, required},
    extract::AppJson,
    middleware::{AdminUser, AuthUser},
};

/// Creates the user routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/users",
            get(list_users)
                .post(create_user)
                .put(update_user)
                .delete(delete_user),
        )
        .route("/users/activity", get(user_activity))
        .route("/users/bulk-delete", post(bulk_delete_users))
        .route("/users/password", post(change_password))
}

// ============================================================================
// Request Types
// ============================================================================

/// `?id=` selector.
#[derive(Debug, Deserialize)]
pub struct UserIdQuery {
    /// Target account.
    pub id: Option<String>,
}

/// `?user_id=` selector.
#[derive(Debug, Deserialize)]
pub struct ActivityQuery {
    /// Account whose deposits to list.
    pub user_id: Option<String>,
}

/// Request body for creating an account.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// `admin` or `petugas`.
    #[serde(default)]
    pub role: String,
    /// Login name.
    #[serde(default)]
    pub username: String,
    /// Plaintext password.
    #[serde(default)]
    pub password: String,
}

/// Request body for updating an account.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    /// New display name.
    pub name: Option<String>,
    /// New role.
    pub role: Option<String>,
    /// New login name.
    pub username: Option<String>,
}

/// Request body for changing the caller's password.
#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    /// Password in use now.
    #[serde(default, alias = "old_password")]
    pub current_password: String,
    /// Replacement password.
    #[serde(default)]
    pub new_password: String,
}

/// Request body for bulk operations.
#[derive(Debug, Deserialize)]
pub struct BulkIdsRequest {
    /// Target ids.
    #[serde(default)]
    pub ids: Vec<String>,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /users - List live accounts.
async fn list_users(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<ApiResponse<Vec<User>>>, ApiError> {
    let users = state.users.list().await?;
    Ok(Json(ApiResponse::success("Users retrieved", users)))
}

/// POST /users - Create an account.
async fn create_user(
    State(state): State<AppState>,
    _admin: AdminUser,
    AppJson(payload): AppJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<ApiResponse<User>>), ApiError> {
    let user = state
        .users
        .create(CreateUserInput {
            name: payload.name,
            role: payload.role,
            username: payload.username,
            password: payload.password,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("User created", user)),
    ))
}

/// PUT /users?id= - Update an account.
async fn update_user(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<UserIdQuery>,
    AppJson(payload): AppJson<UpdateUserRequest>,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    let id = required(query.id, "id")?;
    let user = state
        .users
        .update(
            &id,
            UpdateUserInput {
                name: payload.name,
                role: payload.role,
                username: payload.username,
            },
        )
        .await?;

    Ok(Json(ApiResponse::success("User updated", user)))
}

/// DELETE /users?id= - Soft-delete an account.
async fn delete_user(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<UserIdQuery>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let id = required(query.id, "id")?;
    state.users.soft_delete(&id).await?;
    Ok(Json(ApiResponse::ok("User deleted")))
}

/// GET /users/activity?user_id= - Deposits recorded by an account.
async fn user_activity(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<ActivityQuery>,
) -> Result<Json<ApiResponse<Vec<Transaction>>>, ApiError> {
    let user_id = required(query.user_id, "user_id")?;
    let transactions = state.users.activity(&user_id).await?;
    Ok(Json(ApiResponse::success("User activity retrieved", transactions)))
}

/// POST /users/bulk-delete - Soft-delete several accounts.
async fn bulk_delete_users(
    State(state): State<AppState>,
    _admin: AdminUser,
    AppJson(payload): AppJson<BulkIdsRequest>,
) -> Result<Json<ApiResponse<BulkOutcome>>, ApiError> {
    let outcome = state.users.bulk_soft_delete(&payload.ids).await?;
    let message = format!("{} users deleted", outcome.succeeded);
    Ok(Json(ApiResponse::success(message, outcome)))
}

/// POST /users/password - Change the caller's own password.
async fn change_password(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    state
        .users
        .change_password(
            user.user_id(),
            &payload.current_password,
            &payload.new_password,
        )
        .await?;
    Ok(Json(ApiResponse::ok("Password changed")))
}
