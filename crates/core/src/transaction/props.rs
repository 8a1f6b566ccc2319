//! Property-based tests for the balance invariant.
//!
//! For any mix of deposits and voids, a customer's total equals the sum of
//! the deposits that are still active.

use std::sync::Arc;

use proptest::prelude::*;
use rust_decimal::Decimal;

use super::*;
use crate::auth::{Identity, Role};
use crate::clock::SystemClock;
use crate::customer::CustomerLedger;
use crate::store::MemoryStore;

/// Strategy to generate positive amounts (0.01 to 1,000,000.00).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

fn admin() -> Identity {
    Identity {
        user_id: "USR-001".to_string(),
        name: "Admin".to_string(),
        username: "admin".to_string(),
        role: Role::Admin,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_total_matches_sum_of_deposits(amounts in prop::collection::vec(positive_amount(), 1..20)) {
        runtime().block_on(async {
            let store = MemoryStore::new();
            let clock = Arc::new(SystemClock);
            let ledger = CustomerLedger::new(Arc::new(store.clone()), clock.clone());
            let engine = TransactionEngine::new(Arc::new(store.clone()), clock);
            let customer = ledger.create("A1", "Budi").await.unwrap();

            for nominal in &amounts {
                engine.submit(DepositInput {
                    customer_id: customer.id.clone(),
                    blok: String::new(),
                    name: String::new(),
                    user_id: "USR-001".to_string(),
                    petugas: "Admin".to_string(),
                    nominal: *nominal,
                }).await.unwrap();
            }

            let expected: Decimal = amounts.iter().copied().sum();
            let row = store.customer_record(&customer.id).await.unwrap();
            prop_assert_eq!(row.total_deposits, expected);
            Ok(())
        })?;
    }

    #[test]
    fn prop_total_excludes_voided(
        entries in prop::collection::vec((positive_amount(), any::<bool>()), 1..20),
        bulk in any::<bool>(),
    ) {
        runtime().block_on(async {
            let store = MemoryStore::new();
            let clock = Arc::new(SystemClock);
            let ledger = CustomerLedger::new(Arc::new(store.clone()), clock.clone());
            let engine = TransactionEngine::new(Arc::new(store.clone()), clock);
            let customer = ledger.create("A1", "Budi").await.unwrap();

            let mut to_void = Vec::new();
            let mut expected = Decimal::ZERO;
            for (nominal, void) in &entries {
                let tx = engine.submit(DepositInput {
                    customer_id: customer.id.clone(),
                    blok: String::new(),
                    name: String::new(),
                    user_id: "USR-001".to_string(),
                    petugas: "Admin".to_string(),
                    nominal: *nominal,
                }).await.unwrap();
                if *void {
                    to_void.push(tx.id);
                } else {
                    expected += *nominal;
                }
            }

            if bulk && !to_void.is_empty() {
                let outcome = engine.void_many(&to_void, &admin()).await.unwrap();
                prop_assert_eq!(outcome.succeeded, to_void.len());
            } else {
                for id in &to_void {
                    engine.void_one(id, &admin()).await.unwrap();
                }
            }

            let row = store.customer_record(&customer.id).await.unwrap();
            prop_assert_eq!(row.total_deposits, expected);
            let history = ledger.history(&customer.id).await.unwrap();
            prop_assert_eq!(history.len(), entries.len() - to_void.len());
            Ok(())
        })?;
    }
}
