//! Human-readable identifiers.
//!
//! Ids are derived from a per-kind counter that storage increments inside the
//! caller's unit of work, so concurrent creates never produce the same id.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Prefix mixed into every QR hash.
const QR_SALT: &str = "Jimpitan";

/// Number of hex characters kept from the QR digest.
pub const QR_HASH_LEN: usize = 10;

/// Entity kinds that receive sequential ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// Staff accounts (`USR-001`).
    User,
    /// Residents (`CUST-001`).
    Customer,
    /// Deposits (`0001`).
    Transaction,
}

impl EntityKind {
    /// Key of this kind's counter in storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Customer => "customer",
            Self::Transaction => "transaction",
        }
    }

    /// Formats the id that follows `current_count` issued ids.
    #[must_use]
    pub fn next_id(&self, current_count: u64) -> String {
        let n = current_count + 1;
        match self {
            Self::User => format!("USR-{n:03}"),
            Self::Customer => format!("CUST-{n:03}"),
            Self::Transaction => format!("{n:04}"),
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derives the short QR identifier printed on a customer's card.
///
/// Deterministic: the same customer id always yields the same hash.
#[must_use]
pub fn derive_qr_hash(customer_id: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(QR_SALT.as_bytes());
    hasher.update(customer_id.as_bytes());
    let mut hex = format!("{:x}", hasher.finalize());
    hex.truncate(QR_HASH_LEN);
    hex
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(EntityKind::User, 0, "USR-001")]
    #[case(EntityKind::User, 41, "USR-042")]
    #[case(EntityKind::Customer, 0, "CUST-001")]
    #[case(EntityKind::Customer, 999, "CUST-1000")]
    #[case(EntityKind::Transaction, 0, "0001")]
    #[case(EntityKind::Transaction, 122, "0123")]
    fn test_next_id(#[case] kind: EntityKind, #[case] count: u64, #[case] expected: &str) {
        assert_eq!(kind.next_id(count), expected);
    }

    #[test]
    fn test_qr_hash_is_deterministic_and_short() {
        let a = derive_qr_hash("CUST-001");
        assert_eq!(a, derive_qr_hash("CUST-001"));
        assert_eq!(a.len(), QR_HASH_LEN);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, derive_qr_hash("CUST-002"));
    }

    #[test]
    fn test_qr_hash_uses_salted_sha256_prefix() {
        let full = format!("{:x}", Sha256::digest(b"JimpitanCUST-001"));
        assert_eq!(derive_qr_hash("CUST-001"), full[..QR_HASH_LEN]);
    }
}
