//! JWT token generation and validation.
//!
//! Tokens are HS256-signed. Expiry is not checked here: the caller compares
//! `exp` against its own clock and the persisted session expiry.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use thiserror::Error;

use crate::auth::Claims;

/// JWT configuration.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Secret key for signing tokens.
    pub secret: String,
    /// Session lifetime in hours.
    pub token_expiry_hours: i64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: "change-me-in-production".to_string(),
            token_expiry_hours: 168,
        }
    }
}

/// Errors that can occur during JWT operations.
#[derive(Debug, Error)]
pub enum JwtError {
    /// Token encoding failed.
    #[error("failed to encode token: {0}")]
    EncodingError(String),

    /// Token decoding failed (bad signature, malformed, missing claims).
    #[error("failed to decode token: {0}")]
    DecodingError(String),
}

/// JWT service for token operations.
#[derive(Clone)]
pub struct JwtService {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("token_expiry_hours", &self.config.token_expiry_hours)
            .field("secret", &"[hidden]")
            .finish()
    }
}

impl JwtService {
    /// Creates a new JWT service with the given configuration.
    #[must_use]
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());
        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// Signs a session token.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::EncodingError` if token generation fails.
    pub fn issue(
        &self,
        user_id: &str,
        role: &str,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
        token_id: &str,
    ) -> Result<String, JwtError> {
        let claims = Claims::new(user_id, role, issued_at, expires_at, token_id);

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| JwtError::EncodingError(e.to_string()))
    }

    /// Verifies the signature and decodes the claims.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::DecodingError` if the token is malformed or forged.
    pub fn decode(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::default();
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| JwtError::DecodingError(e.to_string()))
    }

    /// Returns the session lifetime.
    #[must_use]
    pub fn session_ttl(&self) -> Duration {
        Duration::hours(self.config.token_expiry_hours)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn create_test_service() -> JwtService {
        JwtService::new(JwtConfig {
            secret: "test-secret-key-for-testing".to_string(),
            token_expiry_hours: 168,
        })
    }

    #[test]
    fn test_issue_and_decode() {
        let service = create_test_service();
        let issued = Utc::now();
        let expires = issued + service.session_ttl();

        let token = service
            .issue("USR-001", "petugas", issued, expires, "jti-1")
            .unwrap();
        let claims = service.decode(&token).unwrap();

        assert_eq!(claims.user_id(), "USR-001");
        assert_eq!(claims.role, "petugas");
        assert_eq!(claims.exp, expires.timestamp());
    }

    #[test]
    fn test_decode_does_not_check_expiry() {
        let service = create_test_service();
        let issued = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();

        let token = service
            .issue("USR-001", "admin", issued, issued + Duration::hours(1), "jti-2")
            .unwrap();

        assert!(service.decode(&token).is_ok());
    }

    #[test]
    fn test_distinct_token_ids_give_distinct_tokens() {
        let service = create_test_service();
        let now = Utc::now();
        let expires = now + service.session_ttl();

        let a = service.issue("USR-001", "admin", now, expires, "a").unwrap();
        let b = service.issue("USR-001", "admin", now, expires, "b").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_rejects_foreign_signature() {
        let service = create_test_service();
        let other = JwtService::new(JwtConfig {
            secret: "someone-else".to_string(),
            token_expiry_hours: 1,
        });
        let now = Utc::now();
        let token = other
            .issue("USR-001", "admin", now, now + Duration::hours(1), "x")
            .unwrap();

        assert!(matches!(
            service.decode(&token),
            Err(JwtError::DecodingError(_))
        ));
    }

    #[test]
    fn test_invalid_token() {
        let service = create_test_service();
        assert!(service.decode("invalid.token.here").is_err());
    }
}
