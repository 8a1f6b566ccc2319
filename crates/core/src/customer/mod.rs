//! Residents and their running deposit totals.

mod service;
mod types;

pub use service::CustomerLedger;
pub use types::Customer;
