//! Staff account management.

mod service;
mod types;

pub use service::UserService;
pub use types::{CreateUserInput, UpdateUserInput, User};
