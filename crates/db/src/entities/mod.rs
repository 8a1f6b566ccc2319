//! `SeaORM` entities for the Jimpitan schema.

pub mod prelude;

pub mod customers;
pub mod id_sequences;
pub mod sea_orm_active_enums;
pub mod transactions;
pub mod users;
