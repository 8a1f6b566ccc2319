//! Customer repository for database operations.

use chrono::{DateTime, Utc};
use jimpitan_core::customer::Customer;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set,
};

use super::utc;
use crate::entities::customers;

/// Customer repository for CRUD operations and balance updates.
#[derive(Debug)]
pub struct CustomerRepository<'a, C> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> CustomerRepository<'a, C> {
    /// Creates a new customer repository.
    #[must_use]
    pub const fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    /// Inserts a new customer.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn create(&self, customer: &Customer) -> Result<(), DbErr> {
        customers::ActiveModel {
            id: Set(customer.id.clone()),
            blok: Set(customer.blok.clone()),
            name: Set(customer.name.clone()),
            qr_hash: Set(customer.qr_hash.clone()),
            total_deposits: Set(customer.total_deposits),
            last_transaction_at: Set(customer.last_transaction_at.map(Into::into)),
            created_at: Set(customer.created_at.into()),
            updated_at: Set(customer.updated_at.into()),
            deleted_at: Set(customer.deleted_at.map(Into::into)),
        }
        .insert(self.conn)
        .await?;
        Ok(())
    }

    /// Finds a live customer by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: &str) -> Result<Option<customers::Model>, DbErr> {
        customers::Entity::find_by_id(id)
            .filter(customers::Column::DeletedAt.is_null())
            .one(self.conn)
            .await
    }

    /// Finds a live customer by QR hash.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_qr_hash(&self, qr_hash: &str) -> Result<Option<customers::Model>, DbErr> {
        customers::Entity::find()
            .filter(customers::Column::QrHash.eq(qr_hash))
            .filter(customers::Column::DeletedAt.is_null())
            .one(self.conn)
            .await
    }

    /// Lists live customers ordered by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self) -> Result<Vec<customers::Model>, DbErr> {
        customers::Entity::find()
            .filter(customers::Column::DeletedAt.is_null())
            .order_by_asc(customers::Column::Id)
            .all(self.conn)
            .await
    }

    /// Updates blok and name of a live customer.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn update_details(
        &self,
        id: &str,
        blok: &str,
        name: &str,
        at: DateTime<Utc>,
    ) -> Result<bool, DbErr> {
        let result = customers::Entity::update_many()
            .col_expr(customers::Column::Blok, Expr::value(blok))
            .col_expr(customers::Column::Name, Expr::value(name))
            .col_expr(customers::Column::UpdatedAt, Expr::value(at))
            .filter(customers::Column::Id.eq(id))
            .filter(customers::Column::DeletedAt.is_null())
            .exec(self.conn)
            .await?;

        Ok(result.rows_affected == 1)
    }

    /// Soft-deletes a live customer.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn soft_delete(&self, id: &str, at: DateTime<Utc>) -> Result<bool, DbErr> {
        let result = customers::Entity::update_many()
            .col_expr(customers::Column::DeletedAt, Expr::value(at))
            .col_expr(customers::Column::UpdatedAt, Expr::value(at))
            .filter(customers::Column::Id.eq(id))
            .filter(customers::Column::DeletedAt.is_null())
            .exec(self.conn)
            .await?;

        Ok(result.rows_affected == 1)
    }

    /// Adds `delta` to the running total in a single statement.
    ///
    /// Soft-deleted rows are included so that voids keep balancing after
    /// the customer is removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn adjust_balance(
        &self,
        id: &str,
        delta: Decimal,
        at: DateTime<Utc>,
    ) -> Result<bool, DbErr> {
        let mut update = customers::Entity::update_many()
            .col_expr(
                customers::Column::TotalDeposits,
                Expr::col(customers::Column::TotalDeposits).add(delta),
            )
            .col_expr(customers::Column::UpdatedAt, Expr::value(at));
        if delta > Decimal::ZERO {
            update = update.col_expr(customers::Column::LastTransactionAt, Expr::value(at));
        }

        let result = update
            .filter(customers::Column::Id.eq(id))
            .exec(self.conn)
            .await?;

        Ok(result.rows_affected == 1)
    }
}

impl From<customers::Model> for Customer {
    fn from(model: customers::Model) -> Self {
        Self {
            id: model.id,
            blok: model.blok,
            name: model.name,
            qr_hash: model.qr_hash,
            total_deposits: model.total_deposits,
            last_transaction_at: model.last_transaction_at.map(utc),
            created_at: utc(model.created_at),
            updated_at: utc(model.updated_at),
            deleted_at: model.deleted_at.map(utc),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};
    use rust_decimal_macros::dec;

    #[test]
    fn test_model_into_customer_normalizes_to_utc() {
        let jakarta = FixedOffset::east_opt(7 * 3600).unwrap();
        let local = jakarta.with_ymd_and_hms(2026, 3, 1, 15, 0, 0).unwrap();
        let model = customers::Model {
            id: "CUST-001".to_string(),
            blok: "A1".to_string(),
            name: "Budi".to_string(),
            qr_hash: "3f2a9c1b7d".to_string(),
            total_deposits: dec!(12500.00),
            last_transaction_at: Some(local),
            created_at: local,
            updated_at: local,
            deleted_at: None,
        };

        let customer = Customer::from(model);

        assert_eq!(customer.total_deposits, dec!(12500));
        assert_eq!(
            customer.last_transaction_at,
            Some(Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap())
        );
    }
}
