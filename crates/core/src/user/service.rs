//! Account management service.

use std::sync::Arc;

use tracing::info;

use super::types::{CreateUserInput, UpdateUserInput, User};
use crate::auth::{Role, hash_off_thread, verify_off_thread};
use crate::bulk::{self, BulkOutcome};
use crate::clock::Clock;
use crate::error::ServiceError;
use crate::ids::EntityKind;
use crate::store::{Store, UnitOfWork, UserLookup};
use crate::transaction::{Transaction, TransactionFilter};

/// Creates, edits and removes staff accounts.
pub struct UserService {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
}

impl UserService {
    /// Creates a new account service.
    #[must_use]
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Creates an account with the next `USR-###` id.
    ///
    /// # Errors
    ///
    /// - `Validation` for missing fields or an unknown role
    /// - `Conflict` if a live account already uses the username
    pub async fn create(&self, input: CreateUserInput) -> Result<User, ServiceError> {
        let name = input.name.trim();
        let username = input.username.trim();
        if name.is_empty()
            || username.is_empty()
            || input.role.trim().is_empty()
            || input.password.is_empty()
        {
            return Err(ServiceError::Validation(
                "name, role, username and password are required".to_string(),
            ));
        }
        let role: Role = input.role.parse()?;
        let password_hash = hash_off_thread(input.password.clone()).await?;

        let now = self.clock.now();
        let mut uow = self.store.begin().await?;
        ensure_username_free(uow.as_mut(), username).await?;

        let issued = uow.next_sequence(EntityKind::User).await?;
        let user = User {
            id: EntityKind::User.next_id(issued),
            name: name.to_string(),
            role,
            username: username.to_string(),
            password_hash,
            session_token: None,
            token_expiry: None,
            last_login: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        uow.insert_user(&user).await?;
        uow.commit().await?;

        info!(user_id = %user.id, username = %user.username, role = %user.role, "User created");
        Ok(user)
    }

    /// Lists live accounts ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `Storage` on backend failure.
    pub async fn list(&self) -> Result<Vec<User>, ServiceError> {
        let mut uow = self.store.begin().await?;
        Ok(uow.list_users().await?)
    }

    /// Fetches a live account.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no live account has this id.
    pub async fn get(&self, id: &str) -> Result<User, ServiceError> {
        let mut uow = self.store.begin().await?;
        uow.find_user(UserLookup::Id(id))
            .await?
            .ok_or_else(|| ServiceError::not_found("user", id))
    }

    /// Changes name, role and/or username.
    ///
    /// # Errors
    ///
    /// - `Validation` if nothing would change, a field is blank or the role is unknown
    /// - `Conflict` if the new username is taken
    /// - `NotFound` if no live account has this id
    pub async fn update(&self, id: &str, input: UpdateUserInput) -> Result<User, ServiceError> {
        if input.is_empty() {
            return Err(ServiceError::Validation(
                "at least one of name, role or username must be provided".to_string(),
            ));
        }
        let role = input.role.as_deref().map(str::parse::<Role>).transpose()?;
        let name = non_blank(input.name.as_deref(), "name")?;
        let username = non_blank(input.username.as_deref(), "username")?;

        let mut uow = self.store.begin().await?;
        let mut user = uow
            .find_user(UserLookup::Id(id))
            .await?
            .ok_or_else(|| ServiceError::not_found("user", id))?;

        if let Some(username) = username {
            if username != user.username {
                ensure_username_free(uow.as_mut(), username).await?;
            }
            user.username = username.to_string();
        }
        if let Some(name) = name {
            user.name = name.to_string();
        }
        if let Some(role) = role {
            user.role = role;
        }
        user.updated_at = self.clock.now();

        if !uow.save_user(&user).await? {
            return Err(ServiceError::not_found("user", id));
        }
        uow.commit().await?;

        info!(user_id = %user.id, "User updated");
        Ok(user)
    }

    /// Replaces the password after checking the current one.
    ///
    /// # Errors
    ///
    /// - `Validation` for blank input or a wrong current password
    /// - `NotFound` if no live account has this id
    pub async fn change_password(
        &self,
        id: &str,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), ServiceError> {
        if current_password.is_empty() || new_password.is_empty() {
            return Err(ServiceError::Validation(
                "current and new password are required".to_string(),
            ));
        }

        let user = self.get(id).await?;
        let matches =
            verify_off_thread(current_password.to_string(), Some(user.password_hash)).await?;
        if !matches {
            return Err(ServiceError::Validation(
                "current password is incorrect".to_string(),
            ));
        }

        let password_hash = hash_off_thread(new_password.to_string()).await?;

        let mut uow = self.store.begin().await?;
        if !uow
            .set_password_hash(id, &password_hash, self.clock.now())
            .await?
        {
            return Err(ServiceError::not_found("user", id));
        }
        uow.commit().await?;

        info!(user_id = %id, "Password changed");
        Ok(())
    }

    /// Soft-deletes an account and ends its session.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no live account has this id.
    pub async fn soft_delete(&self, id: &str) -> Result<(), ServiceError> {
        let mut uow = self.store.begin().await?;
        if !uow.soft_delete_user(id, self.clock.now()).await? {
            return Err(ServiceError::not_found("user", id));
        }
        uow.commit().await?;

        info!(user_id = %id, "User deleted");
        Ok(())
    }

    /// Soft-deletes each account independently.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for an empty list.
    pub async fn bulk_soft_delete(&self, ids: &[String]) -> Result<BulkOutcome, ServiceError> {
        bulk::apply_each("delete_user", ids, |id| async move {
            self.soft_delete(&id).await
        })
        .await
    }

    /// Active deposits recorded by this account, newest first.
    ///
    /// # Errors
    ///
    /// Returns `Storage` on backend failure.
    pub async fn activity(&self, user_id: &str) -> Result<Vec<Transaction>, ServiceError> {
        let mut uow = self.store.begin().await?;
        Ok(uow
            .list_transactions(&TransactionFilter::for_user(user_id))
            .await?)
    }
}

async fn ensure_username_free(uow: &mut dyn UnitOfWork, username: &str) -> Result<(), ServiceError> {
    if uow.find_user(UserLookup::Username(username)).await?.is_some() {
        return Err(ServiceError::Conflict(format!(
            "username {username} is already taken"
        )));
    }
    Ok(())
}

fn non_blank<'a>(value: Option<&'a str>, field: &str) -> Result<Option<&'a str>, ServiceError> {
    match value.map(str::trim) {
        Some("") => Err(ServiceError::Validation(format!("{field} must not be blank"))),
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::store::MemoryStore;
    use chrono::{TimeZone, Utc};

    fn service() -> UserService {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap());
        UserService::new(Arc::new(MemoryStore::new()), Arc::new(clock))
    }

    fn input(username: &str, role: &str) -> CreateUserInput {
        CreateUserInput {
            name: format!("{username} name"),
            role: role.to_string(),
            username: username.to_string(),
            password: "secret".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_assigns_sequential_ids() {
        let users = service();

        let first = users.create(input("admin", "admin")).await.unwrap();
        let second = users.create(input("sari", "petugas")).await.unwrap();

        assert_eq!(first.id, "USR-001");
        assert_eq!(second.id, "USR-002");
        assert_eq!(second.role, Role::Operator);
        assert!(second.password_hash.starts_with("$argon2id$"));
        assert_eq!(users.list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_create_rejects_duplicates_and_bad_roles() {
        let users = service();
        users.create(input("sari", "petugas")).await.unwrap();

        assert!(matches!(
            users.create(input("sari", "admin")).await,
            Err(ServiceError::Conflict(_))
        ));
        assert!(matches!(
            users.create(input("budi", "bendahara")).await,
            Err(ServiceError::Validation(_))
        ));
        assert!(matches!(
            users.create(input("", "admin")).await,
            Err(ServiceError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_ids_are_not_reused_after_delete() {
        let users = service();
        let first = users.create(input("a", "admin")).await.unwrap();
        users.soft_delete(&first.id).await.unwrap();

        let second = users.create(input("a", "admin")).await.unwrap();
        assert_eq!(second.id, "USR-002");
    }

    #[tokio::test]
    async fn test_update_requires_a_field_and_checks_username() {
        let users = service();
        let sari = users.create(input("sari", "petugas")).await.unwrap();
        users.create(input("budi", "petugas")).await.unwrap();

        assert!(matches!(
            users.update(&sari.id, UpdateUserInput::default()).await,
            Err(ServiceError::Validation(_))
        ));
        assert!(matches!(
            users
                .update(
                    &sari.id,
                    UpdateUserInput {
                        username: Some("budi".into()),
                        ..Default::default()
                    }
                )
                .await,
            Err(ServiceError::Conflict(_))
        ));

        let updated = users
            .update(
                &sari.id,
                UpdateUserInput {
                    name: Some("Sari Wulandari".into()),
                    role: Some("admin".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Sari Wulandari");
        assert_eq!(updated.role, Role::Admin);
        assert_eq!(updated.username, "sari");

        assert!(matches!(
            users
                .update(
                    "USR-404",
                    UpdateUserInput {
                        name: Some("x".into()),
                        ..Default::default()
                    }
                )
                .await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_change_password_checks_current() {
        let users = service();
        let sari = users.create(input("sari", "petugas")).await.unwrap();

        assert!(matches!(
            users.change_password(&sari.id, "wrong", "new-secret").await,
            Err(ServiceError::Validation(_))
        ));
        users
            .change_password(&sari.id, "secret", "new-secret")
            .await
            .unwrap();

        let stored = users.get(&sari.id).await.unwrap();
        assert!(crate::auth::verify_password("new-secret", &stored.password_hash).unwrap());
    }

    #[tokio::test]
    async fn test_password_change_keeps_concurrent_demotion() {
        let users = service();
        let sari = users.create(input("sari", "admin")).await.unwrap();

        let (changed, demoted) = tokio::join!(
            users.change_password(&sari.id, "secret", "new-secret"),
            users.update(
                &sari.id,
                UpdateUserInput {
                    role: Some("petugas".into()),
                    ..Default::default()
                }
            )
        );
        changed.unwrap();
        assert_eq!(demoted.unwrap().role, Role::Operator);

        let stored = users.get(&sari.id).await.unwrap();
        assert_eq!(stored.role, Role::Operator);
        assert!(crate::auth::verify_password("new-secret", &stored.password_hash).unwrap());
    }

    #[tokio::test]
    async fn test_bulk_delete_reports_missing_ids() {
        let users = service();
        let a = users.create(input("a", "petugas")).await.unwrap();
        let b = users.create(input("b", "petugas")).await.unwrap();

        let outcome = users
            .bulk_soft_delete(&[a.id.clone(), "USR-404".to_string(), b.id.clone()])
            .await
            .unwrap();

        assert_eq!(outcome.succeeded, 2);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].id, "USR-404");
        assert!(users.list().await.unwrap().is_empty());
        assert!(matches!(
            users.bulk_soft_delete(&[]).await,
            Err(ServiceError::Validation(_))
        ));
    }
}
