//! Staff account types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::auth::Role;

/// A staff account.
///
/// Secrets (`password_hash`, `session_token`) are never serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    /// `USR-###`.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Access level.
    pub role: Role,
    /// Login name, unique among live accounts.
    pub username: String,
    /// Argon2id PHC string.
    #[serde(skip)]
    pub password_hash: String,
    /// Current session token, if logged in.
    #[serde(skip)]
    pub session_token: Option<String>,
    /// Expiry of the current session.
    pub token_expiry: Option<DateTime<Utc>>,
    /// Last successful login.
    pub last_login: Option<DateTime<Utc>>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
    /// Soft-delete marker.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Input for creating an account.
#[derive(Debug, Clone, Default)]
pub struct CreateUserInput {
    /// Display name.
    pub name: String,
    /// Role name: `admin`, `petugas` or `operator`.
    pub role: String,
    /// Login name.
    pub username: String,
    /// Plaintext password.
    pub password: String,
}

/// Partial update of an account. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateUserInput {
    /// New display name.
    pub name: Option<String>,
    /// New role name.
    pub role: Option<String>,
    /// New login name.
    pub username: Option<String>,
}

impl UpdateUserInput {
    /// True when no field would change.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.role.is_none() && self.username.is_none()
    }
}
