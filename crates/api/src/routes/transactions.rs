//! Deposit routes.
//!
//! Any authenticated caller may record deposits; the recorder is always the
//! caller. Voiding follows the ownership rule, bulk voids are admin-only.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
};
use jimpitan_core::bulk::BulkOutcome;
use jimpitan_core::transaction::{DepositInput, Transaction};
use jimpitan_shared::ApiResponse;
use rust_decimal::Decimal;
use serde::Deserialize;

use super::users::BulkIdsRequest;
use crate::{
    AppState,
    error::{ApiError, required},
    extract::AppJson,
    middleware::{AdminUser, AuthUser},
};

/// Creates the transaction routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/transactions",
            get(list_transactions)
                .post(submit_transaction)
                .delete(void_transaction),
        )
        .route("/transactions/mine", get(my_transactions))
        .route("/transactions/detail", get(get_transaction))
        .route("/transactions/bulk-delete", post(bulk_void_transactions))
}

/// `?id=` selector.
#[derive(Debug, Deserialize)]
pub struct TransactionIdQuery {
    /// Target transaction.
    pub id: Option<String>,
}

/// Request body for recording a deposit.
#[derive(Debug, Deserialize)]
pub struct SubmitTransactionRequest {
    /// Paying customer.
    #[serde(default)]
    pub customer_id: String,
    /// Blok snapshot; taken from the customer when omitted.
    #[serde(default)]
    pub blok: String,
    /// Name snapshot; taken from the customer when omitted.
    #[serde(default)]
    pub name: String,
    /// Collector name; defaults to the caller's name.
    pub petugas: Option<String>,
    /// Amount in rupiah.
    pub nominal: Decimal,
}

/// GET /transactions - All active deposits, newest first.
async fn list_transactions(
    State(state): State<AppState>,
    _user: AuthUser,
) -> Result<Json<ApiResponse<Vec<Transaction>>>, ApiError> {
    let transactions = state.transactions.list_all().await?;
    Ok(Json(ApiResponse::success("Transactions retrieved", transactions)))
}

/// GET /transactions/mine - Deposits recorded by the caller.
async fn my_transactions(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<ApiResponse<Vec<Transaction>>>, ApiError> {
    let transactions = state.transactions.list_for_user(user.user_id()).await?;
    Ok(Json(ApiResponse::success("Transactions retrieved", transactions)))
}

/// GET /transactions/detail?id= - One active deposit.
async fn get_transaction(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(query): Query<TransactionIdQuery>,
) -> Result<Json<ApiResponse<Transaction>>, ApiError> {
    let id = required(query.id, "id")?;
    let transaction = state.transactions.get(&id).await?;
    Ok(Json(ApiResponse::success("Transaction retrieved", transaction)))
}

/// POST /transactions - Record a deposit.
async fn submit_transaction(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<SubmitTransactionRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Transaction>>), ApiError> {
    let identity = user.identity();
    let petugas = payload
        .petugas
        .filter(|p| !p.trim().is_empty())
        .unwrap_or_else(|| identity.name.clone());

    let transaction = state
        .transactions
        .submit(DepositInput {
            customer_id: payload.customer_id,
            blok: payload.blok,
            name: payload.name,
            user_id: identity.user_id.clone(),
            petugas,
            nominal: payload.nominal,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("Transaction recorded", transaction)),
    ))
}

/// DELETE /transactions?id= - Void a deposit.
async fn void_transaction(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<TransactionIdQuery>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let id = required(query.id, "id")?;
    state.transactions.void_one(&id, user.identity()).await?;
    Ok(Json(ApiResponse::ok("Transaction voided")))
}

/// POST /transactions/bulk-delete - Void several deposits.
async fn bulk_void_transactions(
    State(state): State<AppState>,
    admin: AdminUser,
    AppJson(payload): AppJson<BulkIdsRequest>,
) -> Result<Json<ApiResponse<BulkOutcome>>, ApiError> {
    let outcome = state.transactions.void_many(&payload.ids, &admin.0).await?;
    let message = format!("{} transactions voided", outcome.succeeded);
    Ok(Json(ApiResponse::success(message, outcome)))
}
