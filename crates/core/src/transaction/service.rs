//! Transaction engine.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{info, warn};

use super::types::{DepositInput, Transaction, TransactionFilter};
use crate::auth::Identity;
use crate::bulk::{self, BulkOutcome};
use crate::clock::Clock;
use crate::customer::CustomerLedger;
use crate::error::ServiceError;
use crate::ids::EntityKind;
use crate::store::{CustomerLookup, Store, UnitOfWork};

/// Largest amount a NUMERIC(15, 2) column holds.
const MAX_NOMINAL: Decimal = Decimal::from_parts(2_764_472_319, 232_830, 0, false, 2);

/// Records and voids deposits while keeping customer totals in step.
pub struct TransactionEngine {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
}

impl TransactionEngine {
    /// Creates a new transaction engine.
    #[must_use]
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Records a deposit and credits the customer in one unit of work.
    ///
    /// Empty `blok`/`name` are snapshotted from the customer record.
    ///
    /// # Errors
    ///
    /// - `Validation` for a missing customer or user id, or `nominal <= 0`
    /// - `NotFound` if the customer is not live
    /// - `Storage` if either write fails; nothing is persisted in that case
    pub async fn submit(&self, input: DepositInput) -> Result<Transaction, ServiceError> {
        if input.customer_id.trim().is_empty() || input.user_id.trim().is_empty() {
            return Err(ServiceError::Validation(
                "customer_id and user_id are required".to_string(),
            ));
        }
        if input.nominal <= Decimal::ZERO {
            return Err(ServiceError::Validation(
                "nominal must be greater than zero".to_string(),
            ));
        }
        if input.nominal.normalize().scale() > 2 {
            return Err(ServiceError::Validation(
                "nominal must have at most two decimal places".to_string(),
            ));
        }
        if input.nominal > MAX_NOMINAL {
            return Err(ServiceError::Validation(format!(
                "nominal must not exceed {MAX_NOMINAL}"
            )));
        }

        let now = self.clock.now();
        let mut uow = self.store.begin().await?;
        let customer = uow
            .find_customer(CustomerLookup::Id(input.customer_id.trim()))
            .await?
            .ok_or_else(|| ServiceError::not_found("customer", &input.customer_id))?;

        let issued = uow.next_sequence(EntityKind::Transaction).await?;
        let tx = Transaction {
            id: EntityKind::Transaction.next_id(issued),
            timestamp: now,
            blok: snapshot(&input.blok, &customer.blok),
            name: snapshot(&input.name, &customer.name),
            customer_id: customer.id,
            nominal: input.nominal,
            user_id: input.user_id.trim().to_string(),
            petugas: input.petugas.trim().to_string(),
            created_at: now,
            deleted_at: None,
        };
        uow.insert_transaction(&tx).await?;
        CustomerLedger::apply_adjustment(uow.as_mut(), &tx.customer_id, tx.nominal, now).await?;
        uow.commit().await?;

        info!(
            transaction_id = %tx.id,
            customer_id = %tx.customer_id,
            user_id = %tx.user_id,
            nominal = %tx.nominal,
            "Deposit recorded"
        );
        Ok(tx)
    }

    /// Voids one deposit on behalf of `requester`.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the transaction is absent or already voided
    /// - `Forbidden` if an operator targets someone else's deposit
    /// - `Storage` if either write fails; nothing changes in that case
    pub async fn void_one(&self, id: &str, requester: &Identity) -> Result<(), ServiceError> {
        let mut uow = self.store.begin().await?;
        let tx = uow
            .find_transaction(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("transaction", id))?;

        if !requester.can_void(&tx) {
            warn!(
                transaction_id = %id,
                requester = %requester.user_id,
                owner = %tx.user_id,
                "Void refused"
            );
            return Err(ServiceError::Forbidden(
                "operators may only void their own transactions".to_string(),
            ));
        }

        Self::void_in(uow.as_mut(), &tx, self.clock.now()).await?;
        uow.commit().await?;

        info!(transaction_id = %id, voided_by = %requester.user_id, "Deposit voided");
        Ok(())
    }

    /// Voids each id independently, without the ownership check.
    ///
    /// Callers must restrict this to administrators.
    ///
    /// # Errors
    ///
    /// - `Validation` for an empty list
    /// - `AllFailed` when nothing could be voided
    pub async fn void_many(
        &self,
        ids: &[String],
        requester: &Identity,
    ) -> Result<BulkOutcome, ServiceError> {
        let outcome = bulk::apply_each("void_transaction", ids, |id| async move {
            self.void_unchecked(&id).await
        })
        .await?;

        info!(
            requested = ids.len(),
            voided = outcome.succeeded,
            failed = outcome.failures.len(),
            voided_by = %requester.user_id,
            "Bulk void finished"
        );

        if outcome.nothing_succeeded() {
            return Err(ServiceError::AllFailed(outcome.failures));
        }
        Ok(outcome)
    }

    /// Active deposits, newest first.
    ///
    /// # Errors
    ///
    /// Returns `Storage` on backend failure.
    pub async fn list_all(&self) -> Result<Vec<Transaction>, ServiceError> {
        self.list(&TransactionFilter::default()).await
    }

    /// Active deposits recorded by `user_id`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `Storage` on backend failure.
    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<Transaction>, ServiceError> {
        self.list(&TransactionFilter::for_user(user_id)).await
    }

    /// Fetches an active deposit.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if it is absent or voided.
    pub async fn get(&self, id: &str) -> Result<Transaction, ServiceError> {
        let mut uow = self.store.begin().await?;
        uow.find_transaction(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("transaction", id))
    }

    async fn list(&self, filter: &TransactionFilter) -> Result<Vec<Transaction>, ServiceError> {
        let mut uow = self.store.begin().await?;
        Ok(uow.list_transactions(filter).await?)
    }

    async fn void_unchecked(&self, id: &str) -> Result<(), ServiceError> {
        let mut uow = self.store.begin().await?;
        let tx = uow
            .find_transaction(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("transaction", id))?;
        Self::void_in(uow.as_mut(), &tx, self.clock.now()).await?;
        uow.commit().await?;
        Ok(())
    }

    /// Marks `tx` voided and reverses its credit. The void is conditional on
    /// the row still being active, so a concurrent void cannot reverse twice.
    async fn void_in(
        uow: &mut dyn UnitOfWork,
        tx: &Transaction,
        at: DateTime<Utc>,
    ) -> Result<(), ServiceError> {
        if !uow.void_transaction(&tx.id, at).await? {
            return Err(ServiceError::not_found("transaction", &tx.id));
        }
        CustomerLedger::apply_adjustment(uow, &tx.customer_id, -tx.nominal, at).await
    }
}

fn snapshot(given: &str, current: &str) -> String {
    let given = given.trim();
    let value = if given.is_empty() { current } else { given };
    value.to_string()
}
