//! Customer (resident) types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

/// A resident whose deposits are tracked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Customer {
    /// `CUST-###`.
    pub id: String,
    /// Housing unit label.
    pub blok: String,
    /// Resident name.
    pub name: String,
    /// Short identifier printed on the resident's QR card.
    pub qr_hash: String,
    /// Sum of all active deposits.
    pub total_deposits: Decimal,
    /// Time of the most recent deposit.
    pub last_transaction_at: Option<DateTime<Utc>>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
    /// Soft-delete marker.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}
