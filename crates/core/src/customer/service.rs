//! Customer ledger service.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{error, info};

use super::types::Customer;
use crate::bulk::{self, BulkOutcome};
use crate::clock::Clock;
use crate::error::ServiceError;
use crate::ids::{EntityKind, derive_qr_hash};
use crate::store::{CustomerLookup, Store, UnitOfWork};
use crate::transaction::{Transaction, TransactionFilter};

/// Owns customer records and their running deposit totals.
pub struct CustomerLedger {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
}

impl CustomerLedger {
    /// Creates a new customer ledger.
    #[must_use]
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Registers a resident with a zero balance.
    ///
    /// # Errors
    ///
    /// Returns `Validation` if `blok` or `name` is blank.
    pub async fn create(&self, blok: &str, name: &str) -> Result<Customer, ServiceError> {
        let (blok, name) = required_fields(blok, name)?;

        let now = self.clock.now();
        let mut uow = self.store.begin().await?;
        let issued = uow.next_sequence(EntityKind::Customer).await?;
        let id = EntityKind::Customer.next_id(issued);
        let customer = Customer {
            qr_hash: derive_qr_hash(&id),
            id,
            blok: blok.to_string(),
            name: name.to_string(),
            total_deposits: Decimal::ZERO,
            last_transaction_at: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        uow.insert_customer(&customer).await?;
        uow.commit().await?;

        info!(customer_id = %customer.id, blok = %customer.blok, "Customer created");
        Ok(customer)
    }

    /// Adds `delta` to a customer's total in its own unit of work.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the customer row does not exist.
    pub async fn adjust_balance(&self, customer_id: &str, delta: Decimal) -> Result<(), ServiceError> {
        let mut uow = self.store.begin().await?;
        Self::apply_adjustment(uow.as_mut(), customer_id, delta, self.clock.now()).await?;
        uow.commit().await?;
        Ok(())
    }

    /// The balance primitive. Deposits and voids call this inside the unit of
    /// work that writes the transaction, exactly once per write.
    pub(crate) async fn apply_adjustment(
        uow: &mut dyn UnitOfWork,
        customer_id: &str,
        delta: Decimal,
        at: DateTime<Utc>,
    ) -> Result<(), ServiceError> {
        match uow.adjust_balance(customer_id, delta, at).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(ServiceError::not_found("customer", customer_id)),
            Err(e) => {
                error!(customer_id = %customer_id, delta = %delta, error = %e, "Balance update failed");
                Err(e.into())
            }
        }
    }

    /// Finds a live customer by the hash on their QR card.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no live customer carries this hash.
    pub async fn lookup_by_qr_hash(&self, qr_hash: &str) -> Result<Customer, ServiceError> {
        let mut uow = self.store.begin().await?;
        uow.find_customer(CustomerLookup::QrHash(qr_hash.trim()))
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("no customer with qr hash {qr_hash}")))
    }

    /// Fetches a live customer.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no live customer has this id.
    pub async fn get(&self, id: &str) -> Result<Customer, ServiceError> {
        let mut uow = self.store.begin().await?;
        uow.find_customer(CustomerLookup::Id(id))
            .await?
            .ok_or_else(|| ServiceError::not_found("customer", id))
    }

    /// Lists live customers ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `Storage` on backend failure.
    pub async fn list(&self) -> Result<Vec<Customer>, ServiceError> {
        let mut uow = self.store.begin().await?;
        Ok(uow.list_customers().await?)
    }

    /// Renames a customer or moves them to another unit.
    ///
    /// # Errors
    ///
    /// - `Validation` if `blok` or `name` is blank
    /// - `NotFound` if no live customer has this id
    pub async fn update(&self, id: &str, blok: &str, name: &str) -> Result<Customer, ServiceError> {
        let (blok, name) = required_fields(blok, name)?;

        let mut uow = self.store.begin().await?;
        if !uow.update_customer(id, blok, name, self.clock.now()).await? {
            return Err(ServiceError::not_found("customer", id));
        }
        let customer = uow
            .find_customer(CustomerLookup::Id(id))
            .await?
            .ok_or_else(|| ServiceError::not_found("customer", id))?;
        uow.commit().await?;

        info!(customer_id = %id, "Customer updated");
        Ok(customer)
    }

    /// Soft-deletes a customer. Their transactions are left untouched.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no live customer has this id.
    pub async fn soft_delete(&self, id: &str) -> Result<(), ServiceError> {
        let mut uow = self.store.begin().await?;
        if !uow.soft_delete_customer(id, self.clock.now()).await? {
            return Err(ServiceError::not_found("customer", id));
        }
        uow.commit().await?;

        info!(customer_id = %id, "Customer deleted");
        Ok(())
    }

    /// Soft-deletes each customer independently.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for an empty list.
    pub async fn bulk_soft_delete(&self, ids: &[String]) -> Result<BulkOutcome, ServiceError> {
        bulk::apply_each("delete_customer", ids, |id| async move {
            self.soft_delete(&id).await
        })
        .await
    }

    /// Active deposits of a customer, newest first.
    ///
    /// # Errors
    ///
    /// Returns `Storage` on backend failure.
    pub async fn history(&self, customer_id: &str) -> Result<Vec<Transaction>, ServiceError> {
        let mut uow = self.store.begin().await?;
        Ok(uow
            .list_transactions(&TransactionFilter::for_customer(customer_id))
            .await?)
    }
}

fn required_fields<'a>(blok: &'a str, name: &'a str) -> Result<(&'a str, &'a str), ServiceError> {
    let (blok, name) = (blok.trim(), name.trim());
    if blok.is_empty() || name.is_empty() {
        return Err(ServiceError::Validation(
            "blok and name are required".to_string(),
        ));
    }
    Ok((blok, name))
}
