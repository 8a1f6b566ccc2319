//! PostgreSQL implementation of the storage port.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use jimpitan_core::customer::Customer;
use jimpitan_core::ids::EntityKind;
use jimpitan_core::store::{
    CustomerLookup, Store, StoreError, StoreResult, UnitOfWork, UserLookup,
};
use jimpitan_core::transaction::{Transaction, TransactionFilter};
use jimpitan_core::user::User;
use rust_decimal::Decimal;
use sea_orm::{DatabaseConnection, DatabaseTransaction, DbErr, SqlErr, TransactionTrait};
use tracing::error;

use crate::repositories::{
    CustomerRepository, SequenceRepository, TransactionRepository, UserRepository,
};

/// A [`Store`] whose units of work are database transactions.
#[derive(Debug, Clone)]
pub struct PgStore {
    db: DatabaseConnection,
}

impl PgStore {
    /// Creates a store over an existing connection pool.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Returns the underlying connection pool.
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

#[async_trait]
impl Store for PgStore {
    async fn begin(&self) -> StoreResult<Box<dyn UnitOfWork>> {
        let txn = self.db.begin().await.map_err(store_err)?;
        Ok(Box::new(PgUnitOfWork { txn }))
    }
}

/// Rolled back on drop unless committed.
struct PgUnitOfWork {
    txn: DatabaseTransaction,
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn next_sequence(&mut self, kind: EntityKind) -> StoreResult<u64> {
        SequenceRepository::new(&self.txn)
            .next(kind)
            .await
            .map_err(store_err)
    }

    async fn insert_user(&mut self, user: &User) -> StoreResult<()> {
        UserRepository::new(&self.txn)
            .create(user)
            .await
            .map_err(store_err)
    }

    async fn find_user(&mut self, lookup: UserLookup<'_>) -> StoreResult<Option<User>> {
        let repo = UserRepository::new(&self.txn);
        let model = match lookup {
            UserLookup::Id(id) => repo.find_by_id(id).await,
            UserLookup::Username(username) => repo.find_by_username(username).await,
        }
        .map_err(store_err)?;
        Ok(model.map(User::from))
    }

    async fn list_users(&mut self) -> StoreResult<Vec<User>> {
        let models = UserRepository::new(&self.txn).list().await.map_err(store_err)?;
        Ok(models.into_iter().map(User::from).collect())
    }

    async fn save_user(&mut self, user: &User) -> StoreResult<bool> {
        UserRepository::new(&self.txn)
            .save_profile(user)
            .await
            .map_err(store_err)
    }

    async fn set_password_hash(
        &mut self,
        user_id: &str,
        password_hash: &str,
        at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        UserRepository::new(&self.txn)
            .set_password_hash(user_id, password_hash, at)
            .await
            .map_err(store_err)
    }

    async fn record_login(
        &mut self,
        user_id: &str,
        token: &str,
        expiry: DateTime<Utc>,
        at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        UserRepository::new(&self.txn)
            .record_login(user_id, token, expiry, at)
            .await
            .map_err(store_err)
    }

    async fn clear_session(&mut self, user_id: &str, at: DateTime<Utc>) -> StoreResult<bool> {
        UserRepository::new(&self.txn)
            .clear_session(user_id, at)
            .await
            .map_err(store_err)
    }

    async fn soft_delete_user(&mut self, user_id: &str, at: DateTime<Utc>) -> StoreResult<bool> {
        UserRepository::new(&self.txn)
            .soft_delete(user_id, at)
            .await
            .map_err(store_err)
    }

    async fn insert_customer(&mut self, customer: &Customer) -> StoreResult<()> {
        CustomerRepository::new(&self.txn)
            .create(customer)
            .await
            .map_err(store_err)
    }

    async fn find_customer(
        &mut self,
        lookup: CustomerLookup<'_>,
    ) -> StoreResult<Option<Customer>> {
        let repo = CustomerRepository::new(&self.txn);
        let model = match lookup {
            CustomerLookup::Id(id) => repo.find_by_id(id).await,
            CustomerLookup::QrHash(hash) => repo.find_by_qr_hash(hash).await,
        }
        .map_err(store_err)?;
        Ok(model.map(Customer::from))
    }

    async fn list_customers(&mut self) -> StoreResult<Vec<Customer>> {
        let models = CustomerRepository::new(&self.txn)
            .list()
            .await
            .map_err(store_err)?;
        Ok(models.into_iter().map(Customer::from).collect())
    }

    async fn update_customer(
        &mut self,
        customer_id: &str,
        blok: &str,
        name: &str,
        at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        CustomerRepository::new(&self.txn)
            .update_details(customer_id, blok, name, at)
            .await
            .map_err(store_err)
    }

    async fn soft_delete_customer(
        &mut self,
        customer_id: &str,
        at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        CustomerRepository::new(&self.txn)
            .soft_delete(customer_id, at)
            .await
            .map_err(store_err)
    }

    async fn adjust_balance(
        &mut self,
        customer_id: &str,
        delta: Decimal,
        at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        CustomerRepository::new(&self.txn)
            .adjust_balance(customer_id, delta, at)
            .await
            .map_err(store_err)
    }

    async fn insert_transaction(&mut self, tx: &Transaction) -> StoreResult<()> {
        TransactionRepository::new(&self.txn)
            .create(tx)
            .await
            .map_err(store_err)
    }

    async fn find_transaction(&mut self, id: &str) -> StoreResult<Option<Transaction>> {
        let model = TransactionRepository::new(&self.txn)
            .find_active(id)
            .await
            .map_err(store_err)?;
        Ok(model.map(Transaction::from))
    }

    async fn list_transactions(
        &mut self,
        filter: &TransactionFilter,
    ) -> StoreResult<Vec<Transaction>> {
        let models = TransactionRepository::new(&self.txn)
            .list_active(filter)
            .await
            .map_err(store_err)?;
        Ok(models.into_iter().map(Transaction::from).collect())
    }

    async fn void_transaction(&mut self, id: &str, at: DateTime<Utc>) -> StoreResult<bool> {
        TransactionRepository::new(&self.txn)
            .void(id, at)
            .await
            .map_err(store_err)
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        self.txn.commit().await.map_err(store_err)
    }
}

/// Maps a database error onto the storage port's error kinds.
fn store_err(err: DbErr) -> StoreError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => StoreError::Conflict(detail),
        _ => {
            error!(error = %err, "Database operation failed");
            StoreError::Backend(err.to_string())
        }
    }
}
