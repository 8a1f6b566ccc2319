//! Jimpitan API Server
//!
//! Main entry point for the Jimpitan backend service.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use jimpitan_api::{AppState, create_router};
use jimpitan_core::clock::SystemClock;
use jimpitan_db::{PgStore, connect};
use jimpitan_shared::{AppConfig, JwtConfig, JwtService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "jimpitan=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load()?;

    let db = connect(
        &config.database.url,
        config.database.max_connections,
        config.database.min_connections,
    )
    .await?;
    info!(
        max_connections = config.database.max_connections,
        "Connected to database"
    );

    let jwt_service = JwtService::new(JwtConfig {
        secret: config.jwt.secret.clone(),
        token_expiry_hours: config.jwt.token_expiry_hours,
    });
    info!(
        token_expiry_hours = config.jwt.token_expiry_hours,
        "Session tokens configured"
    );

    let state = AppState::new(Arc::new(PgStore::new(db)), jwt_service, Arc::new(SystemClock));
    let app = create_router(state, &config.cors.allowed_origins);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
