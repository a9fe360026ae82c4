use crate::domain::errors::AppError;
use crate::domain::platform::{Platform, PlatformKind, PlatformStatus};
use crate::domain::ports::PlatformRepository;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool, sqlite::SqliteRow};
use std::str::FromStr;

pub struct SqlitePlatformRepository {
    pool: SqlitePool,
}

impl SqlitePlatformRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn map_err(e: sqlx::Error) -> AppError {
    AppError::internal(format!("persistence error: {e}"))
}

fn kind_from_str(s: &str) -> PlatformKind {
    match s {
        "binance" => PlatformKind::Binance,
        "bybit" => PlatformKind::Bybit,
        "okx" => PlatformKind::Okx,
        _ => PlatformKind::Paper,
    }
}

fn kind_to_str(kind: PlatformKind) -> &'static str {
    match kind {
        PlatformKind::Binance => "binance",
        PlatformKind::Bybit => "bybit",
        PlatformKind::Okx => "okx",
        PlatformKind::Paper => "paper",
    }
}

fn status_from_str(s: &str) -> PlatformStatus {
    match s {
        "connecting" => PlatformStatus::Connecting,
        "connected" => PlatformStatus::Connected,
        "error" => PlatformStatus::Error,
        _ => PlatformStatus::Disconnected,
    }
}

fn status_to_str(status: PlatformStatus) -> &'static str {
    match status {
        PlatformStatus::Disconnected => "disconnected",
        PlatformStatus::Connecting => "connecting",
        PlatformStatus::Connected => "connected",
        PlatformStatus::Error => "error",
    }
}

fn row_to_platform(row: SqliteRow) -> Result<Platform, AppError> {
    let created_at: String = row.try_get("created_at").map_err(map_err)?;
    let last_tested_at: Option<String> = row.try_get("last_tested_at").map_err(map_err)?;
    Ok(Platform {
        id: row.try_get("id").map_err(map_err)?,
        owner_id: row.try_get("owner_id").map_err(map_err)?,
        name: row.try_get("name").map_err(map_err)?,
        kind: kind_from_str(&row.try_get::<String, _>("kind").map_err(map_err)?),
        is_sandbox: row.try_get("is_sandbox").map_err(map_err)?,
        is_default: row.try_get("is_default").map_err(map_err)?,
        ciphertext: row.try_get("ciphertext").map_err(map_err)?,
        status: status_from_str(&row.try_get::<String, _>("status").map_err(map_err)?),
        last_tested_at: last_tested_at
            .map(|s| DateTime::<Utc>::from_str(&s))
            .transpose()
            .map_err(|e| AppError::internal(format!("corrupt last_tested_at: {e}")))?,
        created_at: DateTime::<Utc>::from_str(&created_at)
            .map_err(|e| AppError::internal(format!("corrupt created_at: {e}")))?,
    })
}

#[async_trait]
impl PlatformRepository for SqlitePlatformRepository {
    async fn insert(&self, platform: &Platform) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO platforms (id, owner_id, name, kind, is_sandbox, is_default, ciphertext, status, last_tested_at, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&platform.id)
        .bind(&platform.owner_id)
        .bind(&platform.name)
        .bind(kind_to_str(platform.kind))
        .bind(platform.is_sandbox)
        .bind(platform.is_default)
        .bind(&platform.ciphertext)
        .bind(status_to_str(platform.status))
        .bind(platform.last_tested_at.map(|t| t.to_rfc3339()))
        .bind(platform.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(())
    }

    async fn find(&self, id: &str) -> Result<Option<Platform>, AppError> {
        let row = sqlx::query("SELECT * FROM platforms WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err)?;
        row.map(row_to_platform).transpose()
    }

    async fn list_for_owner(&self, owner_id: &str) -> Result<Vec<Platform>, AppError> {
        let rows = sqlx::query("SELECT * FROM platforms WHERE owner_id = ? ORDER BY created_at")
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await
            .map_err(map_err)?;
        rows.into_iter().map(row_to_platform).collect()
    }

    async fn update(&self, platform: &Platform) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE platforms SET
                name = ?, is_sandbox = ?, is_default = ?, ciphertext = ?, status = ?, last_tested_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&platform.name)
        .bind(platform.is_sandbox)
        .bind(platform.is_default)
        .bind(&platform.ciphertext)
        .bind(status_to_str(platform.status))
        .bind(platform.last_tested_at.map(|t| t.to_rfc3339()))
        .bind(&platform.id)
        .execute(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new().connect("sqlite::memory:").await.unwrap();
        sqlx::query(
            r#"
            CREATE TABLE platforms (
                id TEXT PRIMARY KEY, owner_id TEXT NOT NULL, name TEXT NOT NULL, kind TEXT NOT NULL,
                is_sandbox BOOLEAN NOT NULL, is_default BOOLEAN NOT NULL, ciphertext BLOB NOT NULL,
                status TEXT NOT NULL, last_tested_at TEXT, created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await
        .unwrap();
        pool
    }

    fn sample(owner: &str) -> Platform {
        Platform {
            id: "p1".into(),
            owner_id: owner.into(),
            name: "my binance".into(),
            kind: PlatformKind::Binance,
            is_sandbox: true,
            is_default: true,
            ciphertext: vec![1, 2, 3],
            status: PlatformStatus::Disconnected,
            last_tested_at: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn inserts_and_lists_for_owner() {
        let repo = SqlitePlatformRepository::new(pool().await);
        repo.insert(&sample("u1")).await.unwrap();
        let found = repo.list_for_owner("u1").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].kind, PlatformKind::Binance);
    }

    #[tokio::test]
    async fn update_changes_status() {
        let repo = SqlitePlatformRepository::new(pool().await);
        let mut platform = sample("u1");
        repo.insert(&platform).await.unwrap();
        platform.status = PlatformStatus::Connected;
        repo.update(&platform).await.unwrap();
        let found = repo.find("p1").await.unwrap().unwrap();
        assert_eq!(found.status, PlatformStatus::Connected);
    }
}
