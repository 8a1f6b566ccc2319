//! Deposit transaction types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

/// A recorded deposit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transaction {
    /// Zero-padded sequence, e.g. `0001`.
    pub id: String,
    /// When the deposit was recorded.
    pub timestamp: DateTime<Utc>,
    /// Depositing customer.
    pub customer_id: String,
    /// Customer's unit at deposit time.
    pub blok: String,
    /// Customer's name at deposit time.
    pub name: String,
    /// Amount deposited, always positive.
    pub nominal: Decimal,
    /// Recording staff account.
    pub user_id: String,
    /// Display name of the recording staff.
    pub petugas: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Set when the deposit is voided.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Transaction {
    /// True until the deposit is voided.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }
}

/// Input for recording a deposit.
#[derive(Debug, Clone)]
pub struct DepositInput {
    /// Depositing customer.
    pub customer_id: String,
    /// Unit snapshot; taken from the customer when empty.
    pub blok: String,
    /// Name snapshot; taken from the customer when empty.
    pub name: String,
    /// Recording staff account.
    pub user_id: String,
    /// Display name of the recording staff.
    pub petugas: String,
    /// Amount, must be positive.
    pub nominal: Decimal,
}

/// Filter for transaction listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionFilter {
    /// Only this customer's deposits.
    pub customer_id: Option<String>,
    /// Only deposits recorded by this user.
    pub user_id: Option<String>,
}

impl TransactionFilter {
    /// Deposits of one customer.
    #[must_use]
    pub fn for_customer(customer_id: &str) -> Self {
        Self {
            customer_id: Some(customer_id.to_string()),
            user_id: None,
        }
    }

    /// Deposits recorded by one user.
    #[must_use]
    pub fn for_user(user_id: &str) -> Self {
        Self {
            customer_id: None,
            user_id: Some(user_id.to_string()),
        }
    }

    /// True when `tx` passes this filter.
    #[must_use]
    pub fn matches(&self, tx: &Transaction) -> bool {
        self.customer_id
            .as_deref()
            .is_none_or(|id| tx.customer_id == id)
            && self.user_id.as_deref().is_none_or(|id| tx.user_id == id)
    }
}
