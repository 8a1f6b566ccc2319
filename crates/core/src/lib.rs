//! Core business logic for Jimpitan.
//!
//! This crate contains the community-fund rules with ZERO web or database
//! dependencies. Persistence is reached through the [`store`] port.
//!
//! # Modules
//!
//! - `auth` - Login, token verification, roles
//! - `user` - Staff account management
//! - `customer` - Residents and their running deposit totals
//! - `transaction` - Recording and voiding deposits
//! - `bulk` - Per-item batch processing
//! - `ids` - Sequential identifiers and QR hashes
//! - `store` - Storage port and the in-memory store

pub mod auth;
pub mod bulk;
pub mod clock;
pub mod customer;
pub mod error;
pub mod ids;
pub mod store;
pub mod transaction;
pub mod user;

pub use error::ServiceError;
