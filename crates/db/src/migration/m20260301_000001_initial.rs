//! Initial schema: staff accounts, customers, deposits and id counters.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(SCHEMA_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(
            r"
DROP TABLE IF EXISTS transactions CASCADE;
DROP TABLE IF EXISTS customers CASCADE;
DROP TABLE IF EXISTS users CASCADE;
DROP TABLE IF EXISTS id_sequences CASCADE;
DROP TYPE IF EXISTS user_role;
",
        )
        .await?;
        Ok(())
    }
}

const SCHEMA_SQL: &str = r"
CREATE TYPE user_role AS ENUM ('admin', 'petugas');

-- Counters behind USR-###, CUST-### and #### ids. Never decremented.
CREATE TABLE id_sequences (
    kind VARCHAR(20) PRIMARY KEY,
    last_value BIGINT NOT NULL DEFAULT 0 CHECK (last_value >= 0)
);

INSERT INTO id_sequences (kind, last_value) VALUES
    ('user', 0),
    ('customer', 0),
    ('transaction', 0);

CREATE TABLE users (
    id VARCHAR(20) PRIMARY KEY,
    name VARCHAR(255) NOT NULL,
    role user_role NOT NULL DEFAULT 'petugas',
    username VARCHAR(100) NOT NULL,
    password_hash VARCHAR(255) NOT NULL,
    session_token TEXT,
    token_expiry TIMESTAMPTZ,
    last_login TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    deleted_at TIMESTAMPTZ
);

-- Usernames are unique among live accounts only
CREATE UNIQUE INDEX idx_users_username_live ON users(username) WHERE deleted_at IS NULL;

CREATE TABLE customers (
    id VARCHAR(20) PRIMARY KEY,
    blok VARCHAR(100) NOT NULL,
    name VARCHAR(255) NOT NULL,
    qr_hash VARCHAR(10) NOT NULL,
    total_deposits NUMERIC(15, 2) NOT NULL DEFAULT 0,
    last_transaction_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    deleted_at TIMESTAMPTZ
);

CREATE UNIQUE INDEX idx_customers_qr_hash_live ON customers(qr_hash) WHERE deleted_at IS NULL;
CREATE INDEX idx_customers_blok ON customers(blok) WHERE deleted_at IS NULL;

CREATE TABLE transactions (
    id VARCHAR(20) PRIMARY KEY,
    timestamp TIMESTAMPTZ NOT NULL,
    customer_id VARCHAR(20) NOT NULL REFERENCES customers(id),
    blok VARCHAR(100) NOT NULL,
    name VARCHAR(255) NOT NULL,
    nominal NUMERIC(15, 2) NOT NULL CHECK (nominal > 0),
    user_id VARCHAR(20) NOT NULL,
    petugas VARCHAR(255) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    deleted_at TIMESTAMPTZ
);

-- Customer history and operator listings, newest first
CREATE INDEX idx_transactions_customer ON transactions(customer_id, timestamp DESC) WHERE deleted_at IS NULL;
CREATE INDEX idx_transactions_user ON transactions(user_id, timestamp DESC) WHERE deleted_at IS NULL;
CREATE INDEX idx_transactions_timestamp ON transactions(timestamp DESC) WHERE deleted_at IS NULL;
";
