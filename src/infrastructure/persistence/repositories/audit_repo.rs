use crate::domain::errors::AppError;
use crate::domain::ports::AuditRepository;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;

/// Append-only audit trail (spec §7). There is no delete or update method on
/// this repository by design — `AuditRepository::append` is the only write.
pub struct SqliteAuditRepository {
    pool: SqlitePool,
}

impl SqliteAuditRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditRepository for SqliteAuditRepository {
    async fn append(
        &self,
        actor: &str,
        action: &str,
        resource: &str,
        detail: serde_json::Value,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO audit_log (actor, action, resource, detail_json, recorded_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(actor)
        .bind(action)
        .bind(resource)
        .bind(detail.to_string())
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::internal(format!("persistence error: {e}")))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sqlx::Row;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new().connect("sqlite::memory:").await.unwrap();
        sqlx::query(
            r#"
            CREATE TABLE audit_log (
                seq INTEGER PRIMARY KEY AUTOINCREMENT, actor TEXT NOT NULL, action TEXT NOT NULL,
                resource TEXT NOT NULL, detail_json TEXT NOT NULL, recorded_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await
        .unwrap();
        pool
    }

    #[tokio::test]
    async fn append_writes_a_monotonic_sequence() {
        let repo = SqliteAuditRepository::new(pool().await);
        repo.append("u1", "login", "session", json!({})).await.unwrap();
        repo.append("u1", "place_order", "trade:t1", json!({ "symbol": "BTCUSDT" })).await.unwrap();

        let rows = sqlx::query("SELECT seq FROM audit_log ORDER BY seq").fetch_all(&repo.pool).await.unwrap();
        let seqs: Vec<i64> = rows.iter().map(|r| r.try_get("seq").unwrap()).collect();
        assert_eq!(seqs, vec![1, 2]);
    }
}
