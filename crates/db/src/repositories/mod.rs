//! Repository abstractions for data access.
//!
//! Each repository borrows a connection, so the same code runs against the
//! pool or inside a `DatabaseTransaction`. Models convert into the domain
//! types of `jimpitan_core`.

pub mod customer;
pub mod sequence;
pub mod transaction;
pub mod user;

pub use customer::CustomerRepository;
pub use sequence::SequenceRepository;
pub use transaction::TransactionRepository;
pub use user::UserRepository;

use chrono::{DateTime, Utc};
use sea_orm::prelude::DateTimeWithTimeZone;

pub(crate) fn utc(value: DateTimeWithTimeZone) -> DateTime<Utc> {
    value.with_timezone(&Utc)
}
