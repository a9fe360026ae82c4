use crate::domain::errors::AppError;
use crate::domain::notification::{Notification, NotificationKind, Priority};
use crate::domain::ports::NotificationRepository;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool, sqlite::SqliteRow};
use std::str::FromStr;

pub struct SqliteNotificationRepository {
    pool: SqlitePool,
}

impl SqliteNotificationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn map_err(e: sqlx::Error) -> AppError {
    AppError::internal(format!("persistence error: {e}"))
}

fn kind_from_str(s: &str) -> NotificationKind {
    match s {
        "alert_triggered" => NotificationKind::AlertTriggered,
        "system" => NotificationKind::System,
        "recommendation" => NotificationKind::Recommendation,
        _ => NotificationKind::TradeExecuted,
    }
}

fn kind_to_str(kind: NotificationKind) -> &'static str {
    match kind {
        NotificationKind::TradeExecuted => "trade_executed",
        NotificationKind::AlertTriggered => "alert_triggered",
        NotificationKind::System => "system",
        NotificationKind::Recommendation => "recommendation",
    }
}

fn priority_from_str(s: &str) -> Priority {
    match s {
        "medium" => Priority::Medium,
        "high" => Priority::High,
        "critical" => Priority::Critical,
        _ => Priority::Low,
    }
}

fn priority_to_str(priority: Priority) -> &'static str {
    match priority {
        Priority::Low => "low",
        Priority::Medium => "medium",
        Priority::High => "high",
        Priority::Critical => "critical",
    }
}

fn row_to_notification(row: SqliteRow) -> Result<Notification, AppError> {
    let created_at: String = row.try_get("created_at").map_err(map_err)?;
    let read_at: Option<String> = row.try_get("read_at").map_err(map_err)?;
    Ok(Notification {
        id: row.try_get("id").map_err(map_err)?,
        owner_id: row.try_get("owner_id").map_err(map_err)?,
        kind: kind_from_str(&row.try_get::<String, _>("kind").map_err(map_err)?),
        body: row.try_get("body").map_err(map_err)?,
        priority: priority_from_str(&row.try_get::<String, _>("priority").map_err(map_err)?),
        created_at: DateTime::<Utc>::from_str(&created_at)
            .map_err(|e| AppError::internal(format!("corrupt created_at: {e}")))?,
        read_at: read_at
            .map(|s| DateTime::<Utc>::from_str(&s))
            .transpose()
            .map_err(|e| AppError::internal(format!("corrupt read_at: {e}")))?,
    })
}

#[async_trait]
impl NotificationRepository for SqliteNotificationRepository {
    async fn insert(&self, notification: &Notification) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO notifications (id, owner_id, kind, body, priority, created_at, read_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&notification.id)
        .bind(&notification.owner_id)
        .bind(kind_to_str(notification.kind))
        .bind(&notification.body)
        .bind(priority_to_str(notification.priority))
        .bind(notification.created_at.to_rfc3339())
        .bind(notification.read_at.map(|t| t.to_rfc3339()))
        .execute(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(())
    }

    async fn list_for_owner(&self, owner_id: &str) -> Result<Vec<Notification>, AppError> {
        let rows = sqlx::query("SELECT * FROM notifications WHERE owner_id = ? ORDER BY created_at DESC")
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await
            .map_err(map_err)?;
        rows.into_iter().map(row_to_notification).collect()
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
            CREATE TABLE notifications (
                id TEXT PRIMARY KEY, owner_id TEXT NOT NULL, kind TEXT NOT NULL, body TEXT NOT NULL,
                priority TEXT NOT NULL, created_at TEXT NOT NULL, read_at TEXT
            )
            "#,
        )
        .execute(&pool)
        .await
        .unwrap();
        pool
    }

    #[tokio::test]
    async fn inserts_and_lists_newest_first() {
        let repo = SqliteNotificationRepository::new(pool().await);
        let first = Notification::new("u1", NotificationKind::System, "first", Priority::Low);
        repo.insert(&first).await.unwrap();
        let second = Notification::new("u1", NotificationKind::TradeExecuted, "second", Priority::Medium);
        repo.insert(&second).await.unwrap();

        let listed = repo.list_for_owner("u1").await.unwrap();
        assert_eq!(listed.len(), 2);
    }
}
