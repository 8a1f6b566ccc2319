//! In-process store.
//!
//! A unit of work holds the store mutex for its whole lifetime. Reads see the
//! committed state until the first write, which stages a copy; commit swaps the
//! copy in. Units are therefore serialized, which gives the same atomicity the
//! PostgreSQL store gets from database transactions.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{CustomerLookup, Store, StoreError, StoreResult, UnitOfWork, UserLookup};
use crate::customer::Customer;
use crate::ids::EntityKind;
use crate::transaction::{Transaction, TransactionFilter};
use crate::user::User;

#[derive(Debug, Clone, Default)]
struct MemoryState {
    users: BTreeMap<String, User>,
    customers: BTreeMap<String, Customer>,
    transactions: BTreeMap<String, Transaction>,
    sequences: HashMap<EntityKind, u64>,
    failing_balances: HashSet<String>,
}

/// Store backed by process memory. Used by tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every later balance adjustment of `customer_id` fail with a
    /// backend error.
    pub async fn fail_balance_updates_for(&self, customer_id: &str) {
        self.state
            .lock()
            .await
            .failing_balances
            .insert(customer_id.to_string());
    }

    /// Raw customer row, including soft-deleted ones.
    pub async fn customer_record(&self, id: &str) -> Option<Customer> {
        self.state.lock().await.customers.get(id).cloned()
    }

    /// Raw transaction row, including voided ones.
    pub async fn transaction_record(&self, id: &str) -> Option<Transaction> {
        self.state.lock().await.transactions.get(id).cloned()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> StoreResult<Box<dyn UnitOfWork>> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        Ok(Box::new(MemoryUnitOfWork {
            guard,
            staged: None,
        }))
    }
}

struct MemoryUnitOfWork {
    guard: OwnedMutexGuard<MemoryState>,
    staged: Option<MemoryState>,
}

impl MemoryUnitOfWork {
    fn view(&self) -> &MemoryState {
        self.staged.as_ref().unwrap_or(&*self.guard)
    }

    /// Copies the committed state on the first write of the unit.
    fn staged_mut(&mut self) -> &mut MemoryState {
        self.staged.get_or_insert_with(|| self.guard.clone())
    }

    fn live_user_mut(&mut self, id: &str) -> Option<&mut User> {
        self.staged_mut()
            .users
            .get_mut(id)
            .filter(|u| u.deleted_at.is_none())
    }

    fn live_customer_mut(&mut self, id: &str) -> Option<&mut Customer> {
        self.staged_mut()
            .customers
            .get_mut(id)
            .filter(|c| c.deleted_at.is_none())
    }

    fn username_taken(&self, username: &str, except_id: &str) -> bool {
        self.view()
            .users
            .values()
            .any(|u| u.deleted_at.is_none() && u.username == username && u.id != except_id)
    }
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn next_sequence(&mut self, kind: EntityKind) -> StoreResult<u64> {
        let counter = self.staged_mut().sequences.entry(kind).or_insert(0);
        let issued = *counter;
        *counter += 1;
        Ok(issued)
    }

    async fn insert_user(&mut self, user: &User) -> StoreResult<()> {
        if self.view().users.contains_key(&user.id) {
            return Err(StoreError::Conflict(format!("user {} already exists", user.id)));
        }
        if self.username_taken(&user.username, &user.id) {
            return Err(StoreError::Conflict(format!(
                "username {} is already taken",
                user.username
            )));
        }
        self.staged_mut().users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn find_user(&mut self, lookup: UserLookup<'_>) -> StoreResult<Option<User>> {
        let mut live = self.view().users.values().filter(|u| u.deleted_at.is_none());
        let found = match lookup {
            UserLookup::Id(id) => live.find(|u| u.id == id),
            UserLookup::Username(name) => live.find(|u| u.username == name),
        };
        Ok(found.cloned())
    }

    async fn list_users(&mut self) -> StoreResult<Vec<User>> {
        Ok(self
            .view()
            .users
            .values()
            .filter(|u| u.deleted_at.is_none())
            .cloned()
            .collect())
    }

    async fn save_user(&mut self, user: &User) -> StoreResult<bool> {
        if self.username_taken(&user.username, &user.id) {
            return Err(StoreError::Conflict(format!(
                "username {} is already taken",
                user.username
            )));
        }
        let Some(row) = self.live_user_mut(&user.id) else {
            return Ok(false);
        };
        row.name.clone_from(&user.name);
        row.role = user.role;
        row.username.clone_from(&user.username);
        row.updated_at = user.updated_at;
        Ok(true)
    }

    async fn set_password_hash(
        &mut self,
        user_id: &str,
        password_hash: &str,
        at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let Some(row) = self.live_user_mut(user_id) else {
            return Ok(false);
        };
        row.password_hash = password_hash.to_string();
        row.updated_at = at;
        Ok(true)
    }

    async fn record_login(
        &mut self,
        user_id: &str,
        token: &str,
        expiry: DateTime<Utc>,
        at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let Some(row) = self.live_user_mut(user_id) else {
            return Ok(false);
        };
        row.session_token = Some(token.to_string());
        row.token_expiry = Some(expiry);
        row.last_login = Some(at);
        row.updated_at = at;
        Ok(true)
    }

    async fn clear_session(&mut self, user_id: &str, at: DateTime<Utc>) -> StoreResult<bool> {
        let Some(row) = self.staged_mut().users.get_mut(user_id) else {
            return Ok(false);
        };
        row.session_token = None;
        row.token_expiry = None;
        row.updated_at = at;
        Ok(true)
    }

    async fn soft_delete_user(&mut self, user_id: &str, at: DateTime<Utc>) -> StoreResult<bool> {
        let Some(row) = self.live_user_mut(user_id) else {
            return Ok(false);
        };
        row.deleted_at = Some(at);
        row.session_token = None;
        row.token_expiry = None;
        row.updated_at = at;
        Ok(true)
    }

    async fn insert_customer(&mut self, customer: &Customer) -> StoreResult<()> {
        if self.view().customers.contains_key(&customer.id) {
            return Err(StoreError::Conflict(format!(
                "customer {} already exists",
                customer.id
            )));
        }
        let qr_taken = self
            .view()
            .customers
            .values()
            .any(|c| c.deleted_at.is_none() && c.qr_hash == customer.qr_hash);
        if qr_taken {
            return Err(StoreError::Conflict(format!(
                "qr hash {} is already in use",
                customer.qr_hash
            )));
        }
        self.staged_mut()
            .customers
            .insert(customer.id.clone(), customer.clone());
        Ok(())
    }

    async fn find_customer(
        &mut self,
        lookup: CustomerLookup<'_>,
    ) -> StoreResult<Option<Customer>> {
        let mut live = self
            .view()
            .customers
            .values()
            .filter(|c| c.deleted_at.is_none());
        let found = match lookup {
            CustomerLookup::Id(id) => live.find(|c| c.id == id),
            CustomerLookup::QrHash(hash) => live.find(|c| c.qr_hash == hash),
        };
        Ok(found.cloned())
    }

    async fn list_customers(&mut self) -> StoreResult<Vec<Customer>> {
        Ok(self
            .view()
            .customers
            .values()
            .filter(|c| c.deleted_at.is_none())
            .cloned()
            .collect())
    }

    async fn update_customer(
        &mut self,
        customer_id: &str,
        blok: &str,
        name: &str,
        at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let Some(row) = self.live_customer_mut(customer_id) else {
            return Ok(false);
        };
        row.blok = blok.to_string();
        row.name = name.to_string();
        row.updated_at = at;
        Ok(true)
    }

    async fn soft_delete_customer(
        &mut self,
        customer_id: &str,
        at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let Some(row) = self.live_customer_mut(customer_id) else {
            return Ok(false);
        };
        row.deleted_at = Some(at);
        row.updated_at = at;
        Ok(true)
    }

    async fn adjust_balance(
        &mut self,
        customer_id: &str,
        delta: Decimal,
        at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        if self.view().failing_balances.contains(customer_id) {
            return Err(StoreError::Backend(format!(
                "balance update rejected for {customer_id}"
            )));
        }
        let Some(row) = self.staged_mut().customers.get_mut(customer_id) else {
            return Ok(false);
        };
        row.total_deposits = row.total_deposits.checked_add(delta).ok_or_else(|| {
            StoreError::Backend(format!("balance overflow for {customer_id}"))
        })?;
        if delta > Decimal::ZERO {
            row.last_transaction_at = Some(at);
        }
        row.updated_at = at;
        Ok(true)
    }

    async fn insert_transaction(&mut self, tx: &Transaction) -> StoreResult<()> {
        if self.view().transactions.contains_key(&tx.id) {
            return Err(StoreError::Conflict(format!(
                "transaction {} already exists",
                tx.id
            )));
        }
        self.staged_mut().transactions.insert(tx.id.clone(), tx.clone());
        Ok(())
    }

    async fn find_transaction(&mut self, id: &str) -> StoreResult<Option<Transaction>> {
        Ok(self
            .view()
            .transactions
            .get(id)
            .filter(|tx| tx.is_active())
            .cloned())
    }

    async fn list_transactions(
        &mut self,
        filter: &TransactionFilter,
    ) -> StoreResult<Vec<Transaction>> {
        let mut rows: Vec<Transaction> = self
            .view()
            .transactions
            .values()
            .filter(|tx| tx.is_active() && filter.matches(tx))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| b.id.cmp(&a.id)));
        Ok(rows)
    }

    async fn void_transaction(&mut self, id: &str, at: DateTime<Utc>) -> StoreResult<bool> {
        match self.staged_mut().transactions.get_mut(id) {
            Some(tx) if tx.is_active() => {
                tx.deleted_at = Some(at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        let Self { mut guard, staged } = *self;
        if let Some(staged) = staged {
            *guard = staged;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap()
    }

    fn customer(id: &str) -> Customer {
        Customer {
            id: id.to_string(),
            blok: "A1".to_string(),
            name: "Budi".to_string(),
            qr_hash: crate::ids::derive_qr_hash(id),
            total_deposits: Decimal::ZERO,
            last_transaction_at: None,
            created_at: at(),
            updated_at: at(),
            deleted_at: None,
        }
    }

    #[tokio::test]
    async fn test_dropped_unit_discards_writes() {
        let store = MemoryStore::new();

        let mut uow = store.begin().await.unwrap();
        uow.insert_customer(&customer("CUST-001")).await.unwrap();
        drop(uow);

        assert!(store.customer_record("CUST-001").await.is_none());
    }

    #[tokio::test]
    async fn test_commit_publishes_writes() {
        let store = MemoryStore::new();

        let mut uow = store.begin().await.unwrap();
        uow.insert_customer(&customer("CUST-001")).await.unwrap();
        assert!(uow.adjust_balance("CUST-001", dec!(500), at()).await.unwrap());
        uow.commit().await.unwrap();

        let row = store.customer_record("CUST-001").await.unwrap();
        assert_eq!(row.total_deposits, dec!(500));
        assert_eq!(row.last_transaction_at, Some(at()));
    }

    #[tokio::test]
    async fn test_reads_see_own_writes_before_commit() {
        let store = MemoryStore::new();

        let mut uow = store.begin().await.unwrap();
        assert!(uow.list_customers().await.unwrap().is_empty());
        uow.insert_customer(&customer("CUST-001")).await.unwrap();
        assert_eq!(uow.list_customers().await.unwrap().len(), 1);
        uow.commit().await.unwrap();

        let mut uow = store.begin().await.unwrap();
        assert!(
            uow.find_customer(CustomerLookup::Id("CUST-001"))
                .await
                .unwrap()
                .is_some()
        );
        uow.commit().await.unwrap();
        assert!(store.customer_record("CUST-001").await.is_some());
    }

    #[tokio::test]
    async fn test_balance_overflow_is_a_backend_error() {
        let store = MemoryStore::new();

        let mut uow = store.begin().await.unwrap();
        uow.insert_customer(&customer("CUST-001")).await.unwrap();
        assert!(uow.adjust_balance("CUST-001", Decimal::MAX, at()).await.unwrap());
        assert!(matches!(
            uow.adjust_balance("CUST-001", Decimal::MAX, at()).await,
            Err(StoreError::Backend(_))
        ));
    }

    #[tokio::test]
    async fn test_sequences_survive_only_on_commit() {
        let store = MemoryStore::new();

        let mut uow = store.begin().await.unwrap();
        assert_eq!(uow.next_sequence(EntityKind::Customer).await.unwrap(), 0);
        drop(uow);

        let mut uow = store.begin().await.unwrap();
        assert_eq!(uow.next_sequence(EntityKind::Customer).await.unwrap(), 0);
        assert_eq!(uow.next_sequence(EntityKind::Customer).await.unwrap(), 1);
        assert_eq!(uow.next_sequence(EntityKind::User).await.unwrap(), 0);
        uow.commit().await.unwrap();

        let mut uow = store.begin().await.unwrap();
        assert_eq!(uow.next_sequence(EntityKind::Customer).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_adjust_balance_reaches_deleted_customers() {
        let store = MemoryStore::new();

        let mut uow = store.begin().await.unwrap();
        uow.insert_customer(&customer("CUST-001")).await.unwrap();
        assert!(uow.soft_delete_customer("CUST-001", at()).await.unwrap());
        assert!(uow.adjust_balance("CUST-001", dec!(-100), at()).await.unwrap());
        assert!(!uow.adjust_balance("CUST-404", dec!(100), at()).await.unwrap());
        assert!(
            uow.find_customer(CustomerLookup::Id("CUST-001"))
                .await
                .unwrap()
                .is_none()
        );
    }
}
