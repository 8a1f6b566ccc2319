//! Entity re-exports.

pub use super::customers::Entity as Customers;
pub use super::id_sequences::Entity as IdSequences;
pub use super::transactions::Entity as Transactions;
pub use super::users::Entity as Users;
