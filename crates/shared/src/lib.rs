//! Shared errors, configuration, and token handling for Jimpitan.
//!
//! This crate provides the types used across all other crates:
//! - Application-wide error types
//! - Configuration management
//! - JWT issuing and decoding
//! - The `{status, message, data}` response envelope

pub mod auth;
pub mod config;
pub mod error;
pub mod jwt;
pub mod response;

pub use auth::Claims;
pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use jwt::{JwtConfig, JwtError, JwtService};
pub use response::{ApiResponse, ResponseStatus};
