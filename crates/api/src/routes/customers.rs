//! Customer routes.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
};
use jimpitan_core::bulk::BulkOutcome;
use jimpitan_core::customer::Customer;
use jimpitan_core::transaction::Transaction;
use jimpitan_shared::ApiResponse;
use serde::Deserialize;

use super::users::BulkIdsRequest;
use crate::{
    AppState,
    error::{ApiError, required},
    extract::AppJson,
    middleware::{AdminUser, AuthUser},
};

/// Creates the customer routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/customers",
            get(list_customers)
                .post(create_customer)
                .put(update_customer)
                .delete(delete_customer),
        )
        .route("/customers/qr", get(lookup_by_qr))
        .route("/customers/history", get(customer_history))
        .route("/customers/bulk-delete", post(bulk_delete_customers))
}

/// `?id=` selector.
#[derive(Debug, Deserialize)]
pub struct CustomerIdQuery {
    /// Target customer.
    pub id: Option<String>,
}

/// `?qr_hash=` selector.
#[derive(Debug, Deserialize)]
pub struct QrQuery {
    /// Hash printed on the customer's card.
    pub qr_hash: Option<String>,
}

/// `?customer_id=` selector.
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    /// Customer whose deposits to list.
    pub customer_id: Option<String>,
}

/// Request body for creating or updating a customer.
#[derive(Debug, Deserialize)]
pub struct CustomerRequest {
    /// Housing unit.
    #[serde(default)]
    pub blok: String,
    /// Resident name.
    #[serde(default)]
    pub name: String,
}

/// GET /customers - List live customers.
async fn list_customers(
    State(state): State<AppState>,
    _user: AuthUser,
) -> Result<Json<ApiResponse<Vec<Customer>>>, ApiError> {
    let customers = state.customers.list().await?;
    Ok(Json(ApiResponse::success("Customers retrieved", customers)))
}

/// POST /customers - Register a customer.
async fn create_customer(
    State(state): State<AppState>,
    _admin: AdminUser,
    AppJson(payload): AppJson<CustomerRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Customer>>), ApiError> {
    let customer = state
        .customers
        .create(&payload.blok, &payload.name)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("Customer created", customer)),
    ))
}

/// PUT /customers?id= - Update blok and name.
async fn update_customer(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<CustomerIdQuery>,
    AppJson(payload): AppJson<CustomerRequest>,
) -> Result<Json<ApiResponse<Customer>>, ApiError> {
    let id = required(query.id, "id")?;
    let customer = state
        .customers
        .update(&id, &payload.blok, &payload.name)
        .await?;
    Ok(Json(ApiResponse::success("Customer updated", customer)))
}

/// DELETE /customers?id= - Soft-delete a customer.
async fn delete_customer(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<CustomerIdQuery>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let id = required(query.id, "id")?;
    state.customers.soft_delete(&id).await?;
    Ok(Json(ApiResponse::ok("Customer deleted")))
}

/// GET /customers/qr?qr_hash= - Resolve a scanned card.
async fn lookup_by_qr(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(query): Query<QrQuery>,
) -> Result<Json<ApiResponse<Customer>>, ApiError> {
    let qr_hash = required(query.qr_hash, "qr_hash")?;
    let customer = state.customers.lookup_by_qr_hash(&qr_hash).await?;
    Ok(Json(ApiResponse::success("Customer found", customer)))
}

/// GET /customers/history?customer_id= - Active deposits, newest first.
async fn customer_history(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<ApiResponse<Vec<Transaction>>>, ApiError> {
    let customer_id = required(query.customer_id, "customer_id")?;
    let history = state.customers.history(&customer_id).await?;
    Ok(Json(ApiResponse::success("Customer history retrieved", history)))
}

/// POST /customers/bulk-delete - Soft-delete several customers.
async fn bulk_delete_customers(
    State(state): State<AppState>,
    _admin: AdminUser,
    AppJson(payload): AppJson<BulkIdsRequest>,
) -> Result<Json<ApiResponse<BulkOutcome>>, ApiError> {
    let outcome = state.customers.bulk_soft_delete(&payload.ids).await?;
    let message = format!("{} customers deleted", outcome.succeeded);
    Ok(Json(ApiResponse::success(message, outcome)))
}
