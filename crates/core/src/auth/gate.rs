//! Login, token verification and logout.

use std::sync::Arc;

use jimpitan_shared::JwtService;
use tracing::{debug, error, info};
use uuid::Uuid;

use super::{AuthSession, verify_off_thread};
use crate::clock::Clock;
use crate::error::ServiceError;
use crate::store::{Store, UserLookup};

/// Source of the `jti` claim.
pub trait TokenIdSource: Send + Sync {
    /// A fresh, unpredictable token id.
    fn next_token_id(&self) -> String;
}

/// Random v4 UUIDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomTokenIds;

impl TokenIdSource for RandomTokenIds {
    fn next_token_id(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// Issues and checks session tokens.
///
/// A user holds at most one session: every login overwrites the persisted
/// token, so older tokens stop verifying.
pub struct AuthGate {
    store: Arc<dyn Store>,
    jwt: JwtService,
    clock: Arc<dyn Clock>,
    token_ids: Arc<dyn TokenIdSource>,
}

impl AuthGate {
    /// Creates a new auth gate.
    #[must_use]
    pub fn new(
        store: Arc<dyn Store>,
        jwt: JwtService,
        clock: Arc<dyn Clock>,
        token_ids: Arc<dyn TokenIdSource>,
    ) -> Self {
        Self {
            store,
            jwt,
            clock,
            token_ids,
        }
    }

    /// Checks credentials and opens a new session.
    ///
    /// # Errors
    ///
    /// - `Validation` if either field is empty
    /// - `InvalidCredentials` for an unknown user or a wrong password
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<AuthSession, ServiceError> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(ServiceError::Validation(
                "username and password are required".to_string(),
            ));
        }

        let user = {
            let mut uow = self.store.begin().await?;
            uow.find_user(UserLookup::Username(username.trim())).await?
        };

        let stored_hash = user.as_ref().map(|u| u.password_hash.clone());
        let matches = verify_off_thread(password.to_string(), stored_hash)
            .await
            .inspect_err(|e| error!(error = %e, "Password verification error"))?;

        let Some(mut user) = user.filter(|_| matches) else {
            info!(username = %username.trim(), "Failed login attempt");
            return Err(ServiceError::InvalidCredentials);
        };

        let now = self.clock.now();
        let expiry = now + self.jwt.session_ttl();
        let token = self
            .jwt
            .issue(
                &user.id,
                user.role.as_str(),
                now,
                expiry,
                &self.token_ids.next_token_id(),
            )
            .map_err(|e| ServiceError::Internal(e.to_string()))?;

        let mut uow = self.store.begin().await?;
        if !uow.record_login(&user.id, &token, expiry, now).await? {
            // Deleted between the lookup and now.
            return Err(ServiceError::InvalidCredentials);
        }
        uow.commit().await?;

        user.last_login = Some(now);
        info!(user_id = %user.id, role = %user.role, "User logged in");
        Ok(AuthSession::from_user(user, token, expiry))
    }

    /// Resolves a bearer token to its live session.
    ///
    /// # Errors
    ///
    /// - `MissingToken` for an empty token
    /// - `InvalidToken` if it is malformed, forged, superseded or logged out,
    ///   or its user was deleted
    /// - `TokenExpired` once the session expiry has passed
    pub async fn verify(&self, token: &str) -> Result<AuthSession, ServiceError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(ServiceError::MissingToken);
        }

        let claims = self.jwt.decode(token).map_err(|e| {
            debug!(error = %e, "Rejected token");
            ServiceError::InvalidToken
        })?;

        let user = {
            let mut uow = self.store.begin().await?;
            uow.find_user(UserLookup::Id(claims.user_id())).await?
        }
        .ok_or(ServiceError::InvalidToken)?;

        if user.session_token.as_deref() != Some(token) {
            return Err(ServiceError::InvalidToken);
        }
        let Some(expiry) = user.token_expiry else {
            return Err(ServiceError::InvalidToken);
        };

        let now = self.clock.now();
        if now >= expiry || now.timestamp() >= claims.exp {
            return Err(ServiceError::TokenExpired);
        }

        Ok(AuthSession::from_user(user, token.to_string(), expiry))
    }

    /// Ends the user's session. Unknown or logged-out users are not an error.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the session could not be cleared.
    pub async fn invalidate(&self, user_id: &str) -> Result<(), ServiceError> {
        let mut uow = self.store.begin().await?;
        uow.clear_session(user_id, self.clock.now()).await?;
        uow.commit().await?;

        info!(user_id = %user_id, "User logged out");
        Ok(())
    }
}
