//! Storage port consumed by the services.
//!
//! A [`UnitOfWork`] is an atomic scope: its writes become visible to other
//! units only on [`UnitOfWork::commit`], and dropping it without committing
//! discards them. Every multi-step write (deposit + balance, void + reversal,
//! id allocation + insert) happens inside one unit.

mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::customer::Customer;
use crate::ids::EntityKind;
use crate::transaction::{Transaction, TransactionFilter};
use crate::user::User;

/// Result type for storage operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by a storage backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique constraint was violated.
    #[error("{0}")]
    Conflict(String),

    /// Any other backend failure.
    #[error("{0}")]
    Backend(String),
}

/// How to find a live user.
#[derive(Debug, Clone, Copy)]
pub enum UserLookup<'a> {
    /// By id.
    Id(&'a str),
    /// By login name.
    Username(&'a str),
}

/// How to find a live customer.
#[derive(Debug, Clone, Copy)]
pub enum CustomerLookup<'a> {
    /// By id.
    Id(&'a str),
    /// By QR hash.
    QrHash(&'a str),
}

/// Opens units of work.
#[async_trait]
pub trait Store: Send + Sync {
    /// Starts a new atomic scope.
    async fn begin(&self) -> StoreResult<Box<dyn UnitOfWork>>;
}

/// An atomic scope over users, customers and transactions.
///
/// Finders only return live rows (no `deleted_at`). Mutations return `false`
/// when no row matched.
#[async_trait]
pub trait UnitOfWork: Send {
    /// Reserves the next value of `kind`'s counter and returns the number of
    /// ids issued before it.
    async fn next_sequence(&mut self, kind: EntityKind) -> StoreResult<u64>;

    // ========== Users ==========

    /// Inserts a new account. Duplicate live usernames are a `Conflict`.
    async fn insert_user(&mut self, user: &User) -> StoreResult<()>;

    /// Finds a live account.
    async fn find_user(&mut self, lookup: UserLookup<'_>) -> StoreResult<Option<User>>;

    /// Lists live accounts ordered by id.
    async fn list_users(&mut self) -> StoreResult<Vec<User>>;

    /// Writes name, role and username of a live account.
    async fn save_user(&mut self, user: &User) -> StoreResult<bool>;

    /// Replaces only the password hash of a live account.
    async fn set_password_hash(
        &mut self,
        user_id: &str,
        password_hash: &str,
        at: DateTime<Utc>,
    ) -> StoreResult<bool>;

    /// Stores a new session on a live account, replacing any previous one.
    async fn record_login(
        &mut self,
        user_id: &str,
        token: &str,
        expiry: DateTime<Utc>,
        at: DateTime<Utc>,
    ) -> StoreResult<bool>;

    /// Clears the session of an account, live or not.
    async fn clear_session(&mut self, user_id: &str, at: DateTime<Utc>) -> StoreResult<bool>;

    /// Soft-deletes a live account and clears its session.
    async fn soft_delete_user(&mut self, user_id: &str, at: DateTime<Utc>) -> StoreResult<bool>;

    // ========== Customers ==========

    /// Inserts a new customer.
    async fn insert_customer(&mut self, customer: &Customer) -> StoreResult<()>;

    /// Finds a live customer.
    async fn find_customer(&mut self, lookup: CustomerLookup<'_>)
    -> StoreResult<Option<Customer>>;

    /// Lists live customers ordered by id.
    async fn list_customers(&mut self) -> StoreResult<Vec<Customer>>;

    /// Updates blok and name of a live customer.
    async fn update_customer(
        &mut self,
        customer_id: &str,
        blok: &str,
        name: &str,
        at: DateTime<Utc>,
    ) -> StoreResult<bool>;

    /// Soft-deletes a live customer.
    async fn soft_delete_customer(&mut self, customer_id: &str, at: DateTime<Utc>)
    -> StoreResult<bool>;

    /// Adds `delta` to a customer's running total, deleted or not.
    ///
    /// Positive deltas also move `last_transaction_at` to `at`.
    async fn adjust_balance(
        &mut self,
        customer_id: &str,
        delta: Decimal,
        at: DateTime<Utc>,
    ) -> StoreResult<bool>;

    // ========== Transactions ==========

    /// Inserts a new active transaction.
    async fn insert_transaction(&mut self, tx: &Transaction) -> StoreResult<()>;

    /// Finds an active transaction.
    async fn find_transaction(&mut self, id: &str) -> StoreResult<Option<Transaction>>;

    /// Lists active transactions, newest first.
    async fn list_transactions(
        &mut self,
        filter: &TransactionFilter,
    ) -> StoreResult<Vec<Transaction>>;

    /// Voids an active transaction. Returns `false` if it was already voided
    /// or never existed.
    async fn void_transaction(&mut self, id: &str, at: DateTime<Utc>) -> StoreResult<bool>;

    /// Makes every write of this unit visible.
    async fn commit(self: Box<Self>) -> StoreResult<()>;
}
