//! User repository for database operations.

use chrono::{DateTime, Utc};
use jimpitan_core::user::User;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set,
};

use super::utc;
use crate::entities::users;

/// User repository for CRUD operations.
#[derive(Debug)]
pub struct UserRepository<'a, C> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> UserRepository<'a, C> {
    /// Creates a new user repository.
    #[must_use]
    pub const fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    /// Inserts a new account.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn create(&self, user: &User) -> Result<(), DbErr> {
        users::ActiveModel {
            id: Set(user.id.clone()),
            name: Set(user.name.clone()),
            role: Set(user.role.into()),
            username: Set(user.username.clone()),
            password_hash: Set(user.password_hash.clone()),
            session_token: Set(user.session_token.clone()),
            token_expiry: Set(user.token_expiry.map(Into::into)),
            last_login: Set(user.last_login.map(Into::into)),
            created_at: Set(user.created_at.into()),
            updated_at: Set(user.updated_at.into()),
            deleted_at: Set(user.deleted_at.map(Into::into)),
        }
        .insert(self.conn)
        .await?;
        Ok(())
    }

    /// Finds a live user by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: &str) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find_by_id(id)
            .filter(users::Column::DeletedAt.is_null())
            .one(self.conn)
            .await
    }

    /// Finds a live user by username.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_username(&self, username: &str) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .filter(users::Column::DeletedAt.is_null())
            .one(self.conn)
            .await
    }

    /// Lists live users ordered by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self) -> Result<Vec<users::Model>, DbErr> {
        users::Entity::find()
            .filter(users::Column::DeletedAt.is_null())
            .order_by_asc(users::Column::Id)
            .all(self.conn)
            .await
    }

    /// Writes the editable profile fields of a live user.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn save_profile(&self, user: &User) -> Result<bool, DbErr> {
        let role: users::ActiveModel = users::ActiveModel {
            role: Set(user.role.into()),
            ..Default::default()
        };
        let result = users::Entity::update_many()
            .set(role)
            .col_expr(users::Column::Name, Expr::value(user.name.clone()))
            .col_expr(users::Column::Username, Expr::value(user.username.clone()))
            .col_expr(users::Column::UpdatedAt, Expr::value(user.updated_at))
            .filter(users::Column::Id.eq(user.id.as_str()))
            .filter(users::Column::DeletedAt.is_null())
            .exec(self.conn)
            .await?;

        Ok(result.rows_affected == 1)
    }

    /// Replaces the password hash of a live user, leaving the profile alone.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn set_password_hash(
        &self,
        user_id: &str,
        password_hash: &str,
        at: DateTime<Utc>,
    ) -> Result<bool, DbErr> {
        let result = users::Entity::update_many()
            .col_expr(users::Column::PasswordHash, Expr::value(password_hash))
            .col_expr(users::Column::UpdatedAt, Expr::value(at))
            .filter(users::Column::Id.eq(user_id))
            .filter(users::Column::DeletedAt.is_null())
            .exec(self.conn)
            .await?;

        Ok(result.rows_affected == 1)
    }

    /// Stores a fresh session on a live user.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn record_login(
        &self,
        user_id: &str,
        token: &str,
        expiry: DateTime<Utc>,
        at: DateTime<Utc>,
    ) -> Result<bool, DbErr> {
        let result = users::Entity::update_many()
            .col_expr(users::Column::SessionToken, Expr::value(token))
            .col_expr(users::Column::TokenExpiry, Expr::value(expiry))
            .col_expr(users::Column::LastLogin, Expr::value(at))
            .col_expr(users::Column::UpdatedAt, Expr::value(at))
            .filter(users::Column::Id.eq(user_id))
            .filter(users::Column::DeletedAt.is_null())
            .exec(self.conn)
            .await?;

        Ok(result.rows_affected == 1)
    }

    /// Clears the session of a user, live or not.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn clear_session(&self, user_id: &str, at: DateTime<Utc>) -> Result<bool, DbErr> {
        let result = users::Entity::update_many()
            .col_expr(users::Column::SessionToken, Expr::value(Option::<String>::None))
            .col_expr(
                users::Column::TokenExpiry,
                Expr::value(Option::<DateTime<Utc>>::None),
            )
            .col_expr(users::Column::UpdatedAt, Expr::value(at))
            .filter(users::Column::Id.eq(user_id))
            .exec(self.conn)
            .await?;

        Ok(result.rows_affected == 1)
    }

    /// Soft-deletes a live user and ends their session.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn soft_delete(&self, user_id: &str, at: DateTime<Utc>) -> Result<bool, DbErr> {
        let result = users::Entity::update_many()
            .col_expr(users::Column::DeletedAt, Expr::value(at))
            .col_expr(users::Column::SessionToken, Expr::value(Option::<String>::None))
            .col_expr(
                users::Column::TokenExpiry,
                Expr::value(Option::<DateTime<Utc>>::None),
            )
            .col_expr(users::Column::UpdatedAt, Expr::value(at))
            .filter(users::Column::Id.eq(user_id))
            .filter(users::Column::DeletedAt.is_null())
            .exec(self.conn)
            .await?;

        Ok(result.rows_affected == 1)
    }
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            role: model.role.into(),
            username: model.username,
            password_hash: model.password_hash,
            session_token: model.session_token,
            token_expiry: model.token_expiry.map(utc),
            last_login: model.last_login.map(utc),
            created_at: utc(model.created_at),
            updated_at: utc(model.updated_at),
            deleted_at: model.deleted_at.map(utc),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::sea_orm_active_enums::UserRole;
    use chrono::TimeZone;
    use jimpitan_core::auth::Role;

    #[test]
    fn test_model_into_user() {
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap();
        let model = users::Model {
            id: "USR-002".to_string(),
            name: "Petugas".to_string(),
            role: UserRole::Petugas,
            username: "petugas".to_string(),
            password_hash: "$argon2id$stub".to_string(),
            session_token: Some("token".to_string()),
            token_expiry: Some(at.into()),
            last_login: None,
            created_at: at.into(),
            updated_at: at.into(),
            deleted_at: None,
        };

        let user = User::from(model);

        assert_eq!(user.id, "USR-002");
        assert_eq!(user.role, Role::Operator);
        assert_eq!(user.token_expiry, Some(at));
        assert_eq!(user.created_at, at);
        assert!(user.deleted_at.is_none());
    }
}
