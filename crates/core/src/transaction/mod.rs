//! Deposit recording and voiding.
//!
//! A deposit and its balance increment commit together; a void and its
//! balance reversal commit together. There is no path that writes one
//! without the other.

mod service;
mod types;

#[cfg(test)]
mod props;

pub use service::TransactionEngine;
pub use types::{DepositInput, Transaction, TransactionFilter};
