//! Identifier counters.

use jimpitan_core::ids::EntityKind;
use sea_orm::{ConnectionTrait, DbErr, Statement};

const NEXT_SQL: &str =
    "UPDATE id_sequences SET last_value = last_value + 1 WHERE kind = $1 RETURNING last_value";

/// Row-locked counters behind `USR-`, `CUST-` and transaction ids.
#[derive(Debug)]
pub struct SequenceRepository<'a, C> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> SequenceRepository<'a, C> {
    /// Creates a new sequence repository.
    #[must_use]
    pub const fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    /// Bumps the counter of `kind` and returns how many ids were issued
    /// before this one.
    ///
    /// The update holds the row lock until the surrounding transaction ends,
    /// so concurrent allocations queue instead of colliding.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the counter row is missing.
    pub async fn next(&self, kind: EntityKind) -> Result<u64, DbErr> {
        let row = self
            .conn
            .query_one(Statement::from_sql_and_values(
                self.conn.get_database_backend(),
                NEXT_SQL,
                [kind.as_str().into()],
            ))
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(format!("id sequence '{}'", kind.as_str())))?;

        let last_value: i64 = row.try_get("", "last_value")?;
        u64::try_from(last_value - 1).map_err(|e| DbErr::Custom(e.to_string()))
    }
}
