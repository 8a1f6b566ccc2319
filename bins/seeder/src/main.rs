//! Database seeder for Jimpitan development and testing.
//!
//! Creates the default `admin` and `petugas` accounts and a few sample
//! customers. Safe to run repeatedly: existing usernames are skipped and
//! customers are only seeded into an empty table.
//!
//! Usage: cargo run --bin seeder

use std::sync::Arc;

use anyhow::Context;
use jimpitan_core::ServiceError;
use jimpitan_core::clock::SystemClock;
use jimpitan_core::customer::CustomerLedger;
use jimpitan_core::store::Store;
use jimpitan_core::user::{CreateUserInput, UserService};
use jimpitan_db::PgStore;
use jimpitan_shared::AppConfig;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Default accounts: (name, role, username, password).
const ACCOUNTS: [(&str, &str, &str, &str); 2] = [
    ("Administrator", "admin", "admin", "admin123"),
    ("Petugas", "petugas", "petugas", "petugas123"),
];

/// Sample residents: (blok, name).
const CUSTOMERS: [(&str, &str); 3] = [("A1", "Budi"), ("A2", "Siti"), ("B1", "Joko")];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "jimpitan=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let database_url = match std::env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            AppConfig::load()
                .context("DATABASE_URL is not set and no configuration was found")?
                .database
                .url
        }
    };

    info!("Connecting to database...");
    let db = jimpitan_db::connect(&database_url, 2, 1).await?;
    let store: Arc<dyn Store> = Arc::new(PgStore::new(db));
    let clock = Arc::new(SystemClock);

    info!("Seeding accounts...");
    seed_accounts(&UserService::new(store.clone(), clock.clone())).await?;

    info!("Seeding customers...");
    seed_customers(&CustomerLedger::new(store, clock)).await?;

    info!("Seeding complete!");
    Ok(())
}

async fn seed_accounts(users: &UserService) -> anyhow::Result<()> {
    for (name, role, username, password) in ACCOUNTS {
        let created = users
            .create(CreateUserInput {
                name: name.to_string(),
                role: role.to_string(),
                username: username.to_string(),
                password: password.to_string(),
            })
            .await;

        match created {
            Ok(user) => info!(user_id = %user.id, username, "Account created"),
            Err(ServiceError::Conflict(_)) => info!(username, "Account exists, skipping"),
            Err(e) => return Err(e).with_context(|| format!("failed to seed {username}")),
        }
    }
    Ok(())
}

async fn seed_customers(ledger: &CustomerLedger) -> anyhow::Result<()> {
    if !ledger.list().await?.is_empty() {
        info!("Customers exist, skipping");
        return Ok(());
    }

    for (blok, name) in CUSTOMERS {
        let customer = ledger.create(blok, name).await?;
        info!(
            customer_id = %customer.id,
            qr_hash = %customer.qr_hash,
            "Customer created"
        );
    }
    Ok(())
}
