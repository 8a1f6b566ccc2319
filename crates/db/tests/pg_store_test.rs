//! Integration tests for the PostgreSQL store.
//!
//! Each test starts a throwaway Postgres container and runs the migrations.
//! Run with `cargo test -p jimpitan-db -- --ignored`.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use futures::future::join_all;
use jimpitan_core::ServiceError;
use jimpitan_core::auth::{Identity, Role};
use jimpitan_core::clock::SystemClock;
use jimpitan_core::customer::CustomerLedger;
use jimpitan_core::store::Store;
use jimpitan_core::transaction::{DepositInput, TransactionEngine};
use jimpitan_core::user::{CreateUserInput, UpdateUserInput, UserService};
use jimpitan_db::PgStore;
use jimpitan_db::migration::{Migrator, MigratorTrait};
use rust_decimal_macros::dec;
use sea_orm::{Database, EntityTrait};
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;

use jimpitan_db::entities::customers;

struct TestDb {
    store: PgStore,
    // Dropping the handle stops the container.
    _container: ContainerAsync<Postgres>,
}

async fn setup() -> TestDb {
    let container = Postgres::default().start().await.unwrap();
    let url = format!(
        "postgres://postgres:postgres@{}:{}/postgres",
        container.get_host().await.unwrap(),
        container.get_host_port_ipv4(5432).await.unwrap()
    );
    let db = Database::connect(&url).await.unwrap();
    Migrator::up(&db, None).await.unwrap();

    TestDb {
        store: PgStore::new(db),
        _container: container,
    }
}

fn admin() -> Identity {
    Identity {
        user_id: "USR-001".to_string(),
        name: "Admin".to_string(),
        username: "admin".to_string(),
        role: Role::Admin,
    }
}

fn deposit(customer_id: &str, nominal: rust_decimal::Decimal) -> DepositInput {
    DepositInput {
        customer_id: customer_id.to_string(),
        blok: String::new(),
        name: String::new(),
        user_id: "USR-001".to_string(),
        petugas: "Admin".to_string(),
        nominal,
    }
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_deposit_and_void_keep_total_in_step() {
    let db = setup().await;
    let store: Arc<dyn Store> = Arc::new(db.store.clone());
    let ledger = CustomerLedger::new(store.clone(), Arc::new(SystemClock));
    let engine = TransactionEngine::new(store, Arc::new(SystemClock));

    let budi = ledger.create("A1", "Budi").await.unwrap();
    assert_eq!(budi.id, "CUST-001");

    let first = engine.submit(deposit(&budi.id, dec!(2000))).await.unwrap();
    engine.submit(deposit(&budi.id, dec!(500.50))).await.unwrap();
    assert_eq!(first.id, "0001");
    assert_eq!(first.blok, "A1");

    engine.void_one(&first.id, &admin()).await.unwrap();

    let row = customers::Entity::find_by_id("CUST-001")
        .one(db.store.connection())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.total_deposits, dec!(500.50));
    assert!(row.last_transaction_at.is_some());

    let history = ledger.history(&budi.id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, "0002");
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_concurrent_voids_reverse_once() {
    let db = setup().await;
    let store: Arc<dyn Store> = Arc::new(db.store.clone());
    let ledger = CustomerLedger::new(store.clone(), Arc::new(SystemClock));
    let engine = TransactionEngine::new(store, Arc::new(SystemClock));

    let budi = ledger.create("A1", "Budi").await.unwrap();
    let tx = engine.submit(deposit(&budi.id, dec!(1000))).await.unwrap();

    let requester = admin();
    let results = join_all((0..8).map(|_| engine.void_one(&tx.id, &requester))).await;

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(
        results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| matches!(e, ServiceError::NotFound(_)))
    );
    let row = customers::Entity::find_by_id(budi.id.as_str())
        .one(db.store.connection())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.total_deposits, dec!(0));
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_concurrent_creates_get_distinct_ids() {
    let db = setup().await;
    let ledger = CustomerLedger::new(Arc::new(db.store.clone()), Arc::new(SystemClock));

    let created = join_all((0..10).map(|i| {
        let ledger = &ledger;
        async move { ledger.create("B", &format!("Warga {i}")).await }
    }))
    .await;

    let mut ids: Vec<String> = created.into_iter().map(|c| c.unwrap().id).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 10);
    assert_eq!(ids.last().map(String::as_str), Some("CUST-010"));
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_username_reusable_after_delete() {
    let db = setup().await;
    let users = UserService::new(Arc::new(db.store.clone()), Arc::new(SystemClock));
    let input = CreateUserInput {
        name: "Petugas".to_string(),
        role: "petugas".to_string(),
        username: "petugas".to_string(),
        password: "petugas123".to_string(),
    };

    let first = users.create(input.clone()).await.unwrap();
    assert!(matches!(
        users.create(input.clone()).await,
        Err(ServiceError::Conflict(_))
    ));

    users.soft_delete(&first.id).await.unwrap();
    let second = users.create(input).await.unwrap();

    assert_eq!(first.id, "USR-001");
    assert_eq!(second.id, "USR-002");
    assert_eq!(second.role, Role::Operator);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_dropped_unit_of_work_rolls_back() {
    let db = setup().await;
    let ledger = CustomerLedger::new(Arc::new(db.store.clone()), Arc::new(SystemClock));
    let budi = ledger.create("A1", "Budi").await.unwrap();

    {
        let mut uow = db.store.begin().await.unwrap();
        assert!(uow.soft_delete_customer(&budi.id, chrono::Utc::now()).await.unwrap());
    }

    assert_eq!(ledger.get(&budi.id).await.unwrap().id, budi.id);
    assert_eq!(
        ledger.lookup_by_qr_hash(&budi.qr_hash).await.unwrap().id,
        budi.id
    );
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_password_change_leaves_profile_alone() {
    let db = setup().await;
    let users = UserService::new(Arc::new(db.store.clone()), Arc::new(SystemClock));
    let sari = users
        .create(CreateUserInput {
            name: "Sari".to_string(),
            role: "admin".to_string(),
            username: "sari".to_string(),
            password: "secret".to_string(),
        })
        .await
        .unwrap();

    let (changed, demoted) = tokio::join!(
        users.change_password(&sari.id, "secret", "new-secret"),
        users.update(
            &sari.id,
            UpdateUserInput {
                role: Some("petugas".to_string()),
                ..Default::default()
            }
        )
    );
    changed.unwrap();
    demoted.unwrap();

    let stored = users.get(&sari.id).await.unwrap();
    assert_eq!(stored.role, Role::Operator);
    assert!(jimpitan_core::auth::verify_password("new-secret", &stored.password_hash).unwrap());
}
