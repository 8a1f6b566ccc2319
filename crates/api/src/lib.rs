//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes under `/api`
//! - Session-token authentication middleware and role extractors
//! - Mapping from domain errors to the JSON response envelope

pub mod error;
pub mod extract;
pub mod middleware;
pub mod routes;


use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::http::{HeaderValue, Method};
use jimpitan_core::auth::{AuthGate, RandomTokenIds};
use jimpitan_core::clock::Clock;
use jimpitan_core::customer::CustomerLedger;
use jimpitan_core::store::Store;
use jimpitan_core::transaction::TransactionEngine;
use jimpitan_core::user::UserService;
use jimpitan_shared::JwtService;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Login, token verification and logout.
    pub auth: Arc<AuthGate>,
    /// Staff account management.
    pub users: Arc<UserService>,
    /// Customers and their balances.
    pub customers: Arc<CustomerLedger>,
    /// Deposits and voids.
    pub transactions: Arc<TransactionEngine>,
}

impl AppState {
    /// Wires every service onto one store and clock.
    #[must_use]
    pub fn new(store: Arc<dyn Store>, jwt: JwtService, clock: Arc<dyn Clock>) -> Self {
        Self {
            auth: Arc::new(AuthGate::new(
                store.clone(),
                jwt,
                clock.clone(),
                Arc::new(RandomTokenIds),
            )),
            users: Arc::new(UserService::new(store.clone(), clock.clone())),
            customers: Arc::new(CustomerLedger::new(store.clone(), clock.clone())),
            transactions: Arc::new(TransactionEngine::new(store, clock)),
        }
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState, allowed_origins: &[String]) -> Router {
    Router::new()
        .merge(routes::health::root_routes())
        .nest("/api", routes::api_routes_with_state(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(allowed_origins))
        .with_state(state)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin.trim()) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any)
        .max_age(Duration::from_secs(3600))
}
