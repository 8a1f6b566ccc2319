//! Authentication, sessions and roles.
//!
//! This module provides:
//! - Password hashing with Argon2id
//! - The auth gate (login, token verification, logout)
//! - Role and identity types used for authorization

mod gate;
mod password;


pub use gate::{AuthGate, RandomTokenIds, TokenIdSource};
pub use password::{PasswordError, hash_password, verify_password};

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ServiceError;
use crate::transaction::Transaction;
use crate::user::User;

/// Access level of a staff account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Manages accounts and customers, may void any deposit.
    #[serde(rename = "admin")]
    Admin,
    /// Field staff (*petugas*): records deposits, may void only their own.
    #[serde(rename = "petugas", alias = "operator")]
    Operator,
}

impl Role {
    /// Wire name of the role.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Operator => "petugas",
        }
    }

    /// Returns true if this role may manage accounts, customers and batches.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl FromStr for Role {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "petugas" | "operator" => Ok(Self::Operator),
            other => Err(ServiceError::Validation(format!(
                "role must be 'admin' or 'petugas', got '{other}'"
            ))),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The authenticated caller, passed explicitly into every operation that
/// authorizes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    /// Account id.
    pub user_id: String,
    /// Display name.
    pub name: String,
    /// Login name.
    pub username: String,
    /// Access level.
    pub role: Role,
}

impl Identity {
    /// Admins may void anything; operators only what they recorded.
    #[must_use]
    pub fn can_void(&self, tx: &Transaction) -> bool {
        self.role.is_admin() || tx.user_id == self.user_id
    }
}

/// A live session as returned by login and token verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthSession {
    /// Account id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Access level.
    pub role: Role,
    /// Login name.
    pub username: String,
    /// Bearer token.
    pub token: String,
    /// When the token stops being accepted.
    pub token_expiry: DateTime<Utc>,
    /// Last successful login.
    pub last_login: Option<DateTime<Utc>>,
}

impl AuthSession {
    pub(crate) fn from_user(user: User, token: String, token_expiry: DateTime<Utc>) -> Self {
        Self {
            id: user.id,
            name: user.name,
            role: user.role,
            username: user.username,
            token,
            token_expiry,
            last_login: user.last_login,
        }
    }

    /// The caller identity carried by this session.
    #[must_use]
    pub fn identity(&self) -> Identity {
        Identity {
            user_id: self.id.clone(),
            name: self.name.clone(),
            username: self.username.clone(),
            role: self.role,
        }
    }
}

/// Hashes on the blocking pool so Argon2 never stalls the executor.
pub(crate) async fn hash_off_thread(password: String) -> Result<String, ServiceError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| ServiceError::Internal(e.to_string()))?
        .map_err(|e| ServiceError::Internal(e.to_string()))
}

/// Verifies on the blocking pool. With no stored hash a throwaway
/// verification still runs and `false` is returned.
pub(crate) async fn verify_off_thread(
    password: String,
    hash: Option<String>,
) -> Result<bool, ServiceError> {
    tokio::task::spawn_blocking(move || match hash {
        Some(hash) => verify_password(&password, &hash),
        None => {
            password::burn_verification(&password);
            Ok(false)
        }
    })
    .await
    .map_err(|e| ServiceError::Internal(e.to_string()))?
    .map_err(|e| ServiceError::Internal(e.to_string()))
}

#[cfg(test)]
mod role_tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("admin", Role::Admin)]
    #[case("petugas", Role::Operator)]
    #[case("operator", Role::Operator)]
    #[case(" Admin ", Role::Admin)]
    fn test_role_parse(#[case] raw: &str, #[case] expected: Role) {
        assert_eq!(raw.parse::<Role>().unwrap(), expected);
    }

    #[test]
    fn test_role_parse_rejects_unknown() {
        assert!(matches!(
            "superuser".parse::<Role>(),
            Err(ServiceError::Validation(_))
        ));
    }

    #[test]
    fn test_role_wire_names() {
        assert_eq!(serde_json::to_string(&Role::Operator).unwrap(), "\"petugas\"");
        assert_eq!(
            serde_json::from_str::<Role>("\"operator\"").unwrap(),
            Role::Operator
        );
        assert!(Role::Admin.is_admin());
        assert!(!Role::Operator.is_admin());
    }
}
