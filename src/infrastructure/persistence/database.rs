//! SQLite connection pool and schema migrations (spec §3's entity set),
//! grounded on `infrastructure/persistence/database.rs` (WAL journal mode,
//! `CREATE TABLE IF NOT EXISTS` migrations run at startup, no external
//! migration tool).

use crate::domain::errors::AppError;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use tracing::info;

#[derive(Clone)]
pub struct Database {
    pub pool: SqlitePool,
}

impl Database {
    pub async fn connect(db_url: &str) -> Result<Self, AppError> {
        if let Some(path_part) = db_url.strip_prefix("sqlite://") {
            let path = Path::new(path_part);
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
                && !parent.exists()
            {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| AppError::internal(format!("failed to create database directory: {e}")))?;
            }
        }

        let options = SqliteConnectOptions::from_str(db_url)
            .map_err(|e| AppError::internal(format!("invalid database url: {e}")))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| AppError::internal(format!("failed to connect to sqlite: {e}")))?;

        info!(db_url, "connected to database");

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    async fn migrate(&self) -> Result<(), AppError> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| AppError::internal(format!("failed to acquire connection: {e}")))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                username TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                role TEXT NOT NULL,
                two_factor_enabled BOOLEAN NOT NULL DEFAULT 0,
                totp_secret_base32 TEXT,
                mode TEXT NOT NULL DEFAULT 'learning_only',
                created_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&mut *conn)
        .await
        .map_err(|e| AppError::internal(format!("failed to create users table: {e}")))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS portfolios (
                owner_id TEXT PRIMARY KEY,
                total_balance TEXT NOT NULL,
                available_balance TEXT NOT NULL,
                invested_balance TEXT NOT NULL,
                daily_pnl TEXT NOT NULL,
                total_pnl TEXT NOT NULL,
                positions_json TEXT NOT NULL,
                trading_day_start_balance TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&mut *conn)
        .await
        .map_err(|e| AppError::internal(format!("failed to create portfolios table: {e}")))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS platforms (
                id TEXT PRIMARY KEY,
                owner_id TEXT NOT NULL,
                name TEXT NOT NULL,
                kind TEXT NOT NULL,
                is_sandbox BOOLEAN NOT NULL,
                is_default BOOLEAN NOT NULL,
                ciphertext BLOB NOT NULL,
                status TEXT NOT NULL,
                last_tested_at TEXT,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_platforms_owner ON platforms (owner_id);
            "#,
        )
        .execute(&mut *conn)
        .await
        .map_err(|e| AppError::internal(format!("failed to create platforms table: {e}")))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS trades (
                id TEXT PRIMARY KEY,
                owner_id TEXT NOT NULL,
                platform_id TEXT,
                symbol TEXT NOT NULL,
                side TEXT NOT NULL,
                order_type TEXT NOT NULL,
                quantity TEXT NOT NULL,
                entry_price TEXT NOT NULL,
                exit_price TEXT,
                stop_loss TEXT,
                take_profit TEXT,
                status TEXT NOT NULL,
                pnl TEXT NOT NULL,
                execution_kind TEXT NOT NULL,
                market_price_at_execution TEXT NOT NULL,
                exchange_order_id TEXT,
                idempotency_key TEXT,
                created_at TEXT NOT NULL,
                closed_at TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_trades_owner ON trades (owner_id);
            CREATE INDEX IF NOT EXISTS idx_trades_owner_status ON trades (owner_id, status);
            CREATE UNIQUE INDEX IF NOT EXISTS idx_trades_owner_idempotency
                ON trades (owner_id, idempotency_key) WHERE idempotency_key IS NOT NULL;
            "#,
        )
        .execute(&mut *conn)
        .await
        .map_err(|e| AppError::internal(format!("failed to create trades table: {e}")))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS alerts (
                id TEXT PRIMARY KEY,
                owner_id TEXT NOT NULL,
                symbol TEXT NOT NULL,
                condition TEXT NOT NULL,
                threshold TEXT NOT NULL,
                fingerprint TEXT NOT NULL,
                state TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_alerts_owner ON alerts (owner_id);
            CREATE UNIQUE INDEX IF NOT EXISTS idx_alerts_owner_fingerprint_armed
                ON alerts (owner_id, fingerprint) WHERE state = 'armed';
            "#,
        )
        .execute(&mut *conn)
        .await
        .map_err(|e| AppError::internal(format!("failed to create alerts table: {e}")))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS notifications (
                id TEXT PRIMARY KEY,
                owner_id TEXT NOT NULL,
                kind TEXT NOT NULL,
                body TEXT NOT NULL,
                priority TEXT NOT NULL,
                created_at TEXT NOT NULL,
                read_at TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_notifications_owner ON notifications (owner_id, created_at);
            "#,
        )
        .execute(&mut *conn)
        .await
        .map_err(|e| AppError::internal(format!("failed to create notifications table: {e}")))?;

        // Append-only; `seq` gives a total order independent of wall-clock skew.
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS audit_log (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                actor TEXT NOT NULL,
                action TEXT NOT NULL,
                resource TEXT NOT NULL,
                detail_json TEXT NOT NULL,
                recorded_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&mut *conn)
        .await
        .map_err(|e| AppError::internal(format!("failed to create audit_log table: {e}")))?;

        info!("database schema migrated");
        Ok(())
    }
}
