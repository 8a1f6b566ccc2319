//! Authentication types shared by the token service and the HTTP layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// JWT claims for session tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID, e.g. `USR-001`).
    pub sub: String,
    /// User's role at issue time.
    pub role: String,
    /// Issued at timestamp.
    pub iat: i64,
    /// Expiration timestamp.
    pub exp: i64,
    /// Unique token ID, so two logins in the same second still differ.
    pub jti: String,
}

impl Claims {
    /// Creates new claims for a user.
    #[must_use]
    pub fn new(
        user_id: &str,
        role: &str,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
        token_id: &str,
    ) -> Self {
        Self {
            sub: user_id.to_string(),
            role: role.to_string(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
            jti: token_id.to_string(),
        }
    }

    /// Returns the user ID from claims.
    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.sub
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_claims_new_sets_correct_fields() {
        let issued = Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap();
        let expires = issued + Duration::hours(168);

        let claims = Claims::new("USR-001", "admin", issued, expires, "tok-1");

        assert_eq!(claims.user_id(), "USR-001");
        assert_eq!(claims.role, "admin");
        assert_eq!(claims.iat, issued.timestamp());
        assert_eq!(claims.exp - claims.iat, 168 * 3600);
        assert_eq!(claims.jti, "tok-1");
    }
}
