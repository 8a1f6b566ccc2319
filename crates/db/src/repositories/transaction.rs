//! Transaction repository for database operations.

use chrono::{DateTime, Utc};
use jimpitan_core::transaction::{Transaction, TransactionFilter};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set,
};

use super::utc;
use crate::entities::transactions;

/// Transaction repository for recording, listing and voiding deposits.
#[derive(Debug)]
pub struct TransactionRepository<'a, C> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> TransactionRepository<'a, C> {
    /// Creates a new transaction repository.
    #[must_use]
    pub const fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    /// Inserts a new deposit.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn create(&self, tx: &Transaction) -> Result<(), DbErr> {
        transactions::ActiveModel {
            id: Set(tx.id.clone()),
            timestamp: Set(tx.timestamp.into()),
            customer_id: Set(tx.customer_id.clone()),
            blok: Set(tx.blok.clone()),
            name: Set(tx.name.clone()),
            nominal: Set(tx.nominal),
            user_id: Set(tx.user_id.clone()),
            petugas: Set(tx.petugas.clone()),
            created_at: Set(tx.created_at.into()),
            deleted_at: Set(tx.deleted_at.map(Into::into)),
        }
        .insert(self.conn)
        .await?;
        Ok(())
    }

    /// Finds an active deposit by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_active(&self, id: &str) -> Result<Option<transactions::Model>, DbErr> {
        transactions::Entity::find_by_id(id)
            .filter(transactions::Column::DeletedAt.is_null())
            .one(self.conn)
            .await
    }

    /// Lists active deposits matching `filter`, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_active(
        &self,
        filter: &TransactionFilter,
    ) -> Result<Vec<transactions::Model>, DbErr> {
        let mut query =
            transactions::Entity::find().filter(transactions::Column::DeletedAt.is_null());

        if let Some(customer_id) = &filter.customer_id {
            query = query.filter(transactions::Column::CustomerId.eq(customer_id.as_str()));
        }
        if let Some(user_id) = &filter.user_id {
            query = query.filter(transactions::Column::UserId.eq(user_id.as_str()));
        }

        query
            .order_by_desc(transactions::Column::Timestamp)
            .order_by_desc(transactions::Column::Id)
            .all(self.conn)
            .await
    }

    /// Voids an active deposit.
    ///
    /// The `deleted_at IS NULL` guard makes this the arbiter between
    /// concurrent voids: only one of them sees a matched row.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn void(&self, id: &str, at: DateTime<Utc>) -> Result<bool, DbErr> {
        let result = transactions::Entity::update_many()
            .col_expr(transactions::Column::DeletedAt, Expr::value(at))
            .filter(transactions::Column::Id.eq(id))
            .filter(transactions::Column::DeletedAt.is_null())
            .exec(self.conn)
            .await?;

        Ok(result.rows_affected == 1)
    }
}

impl From<transactions::Model> for Transaction {
    fn from(model: transactions::Model) -> Self {
        Self {
            id: model.id,
            timestamp: utc(model.timestamp),
            customer_id: model.customer_id,
            blok: model.blok,
            name: model.name,
            nominal: model.nominal,
            user_id: model.user_id,
            petugas: model.petugas,
            created_at: utc(model.created_at),
            deleted_at: model.deleted_at.map(utc),
        }
    }
}
