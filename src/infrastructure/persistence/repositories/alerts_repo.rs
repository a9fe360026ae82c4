use crate::domain::alert::{AlertCondition, AlertState, SmartAlert};
use crate::domain::errors::AppError;
use crate::domain::ports::AlertRepository;
use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{Row, SqlitePool, sqlite::SqliteRow};

pub struct SqliteAlertRepository {
    pool: SqlitePool,
}

impl SqliteAlertRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn map_err(e: sqlx::Error) -> AppError {
    AppError::internal(format!("persistence error: {e}"))
}

fn condition_from_str(s: &str) -> AlertCondition {
    match s {
        "price_below" => AlertCondition::PriceBelow,
        "rsi_above" => AlertCondition::RsiAbove,
        "rsi_below" => AlertCondition::RsiBelow,
        "volume_spike" => AlertCondition::VolumeSpike,
        _ => AlertCondition::PriceAbove,
    }
}

fn condition_to_str(condition: AlertCondition) -> &'static str {
    match condition {
        AlertCondition::PriceAbove => "price_above",
        AlertCondition::PriceBelow => "price_below",
        AlertCondition::RsiAbove => "rsi_above",
        AlertCondition::RsiBelow => "rsi_below",
        AlertCondition::VolumeSpike => "volume_spike",
    }
}

fn state_from_str(s: &str) -> AlertState {
    match s {
        "triggered" => AlertState::Triggered,
        "dismissed" => AlertState::Dismissed,
        _ => AlertState::Armed,
    }
}

fn state_to_str(state: AlertState) -> &'static str {
    match state {
        AlertState::Armed => "armed",
        AlertState::Triggered => "triggered",
        AlertState::Dismissed => "dismissed",
    }
}

fn row_to_alert(row: SqliteRow) -> Result<SmartAlert, AppError> {
    let threshold: String = row.try_get("threshold").map_err(map_err)?;
    Ok(SmartAlert {
        id: row.try_get("id").map_err(map_err)?,
        owner_id: row.try_get("owner_id").map_err(map_err)?,
        symbol: row.try_get("symbol").map_err(map_err)?,
        condition: condition_from_str(&row.try_get::<String, _>("condition").map_err(map_err)?),
        threshold: threshold
            .parse::<Decimal>()
            .map_err(|_| AppError::internal(format!("corrupt threshold column: {threshold}")))?,
        fingerprint: row.try_get("fingerprint").map_err(map_err)?,
        state: state_from_str(&row.try_get::<String, _>("state").map_err(map_err)?),
    })
}

#[async_trait]
impl AlertRepository for SqliteAlertRepository {
    async fn insert(&self, alert: &SmartAlert) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO alerts (id, owner_id, symbol, condition, threshold, fingerprint, state)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&alert.id)
        .bind(&alert.owner_id)
        .bind(&alert.symbol)
        .bind(condition_to_str(alert.condition))
        .bind(alert.threshold.to_string())
        .bind(&alert.fingerprint)
        .bind(state_to_str(alert.state))
        .execute(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::conflict("an armed alert with this fingerprint already exists")
            }
            _ => map_err(e),
        })?;
        Ok(())
    }

    async fn update(&self, alert: &SmartAlert) -> Result<(), AppError> {
        sqlx::query("UPDATE alerts SET state = ? WHERE id = ?")
            .bind(state_to_str(alert.state))
            .bind(&alert.id)
            .execute(&self.pool)
            .await
            .map_err(map_err)?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM alerts WHERE id = ?").bind(id).execute(&self.pool).await.map_err(map_err)?;
        Ok(())
    }

    async fn list_for_owner(&self, owner_id: &str) -> Result<Vec<SmartAlert>, AppError> {
        let rows = sqlx::query("SELECT * FROM alerts WHERE owner_id = ?")
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await
            .map_err(map_err)?;
        rows.into_iter().map(row_to_alert).collect()
    }

    async fn list_armed(&self) -> Result<Vec<SmartAlert>, AppError> {
        let rows = sqlx::query("SELECT * FROM alerts WHERE state = 'armed'")
            .fetch_all(&self.pool)
            .await
            .map_err(map_err)?;
        rows.into_iter().map(row_to_alert).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::alert::alert_fingerprint;
    use rust_decimal_macros::dec;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new().connect("sqlite::memory:").await.unwrap();
        sqlx::query(
            r#"
            CREATE TABLE alerts (
                id TEXT PRIMARY KEY, owner_id TEXT NOT NULL, symbol TEXT NOT NULL, condition TEXT NOT NULL,
                threshold TEXT NOT NULL, fingerprint TEXT NOT NULL, state TEXT NOT NULL
            );
            CREATE UNIQUE INDEX idx_alerts_owner_fingerprint_armed
                ON alerts (owner_id, fingerprint) WHERE state = 'armed';
            "#,
        )
        .execute(&pool)
        .await
        .unwrap();
        pool
    }

    fn sample() -> SmartAlert {
        SmartAlert {
            id: "a1".into(),
            owner_id: "u1".into(),
            symbol: "BTCUSDT".into(),
            condition: AlertCondition::PriceAbove,
            threshold: dec!(60000),
            fingerprint: alert_fingerprint("u1", "BTCUSDT", AlertCondition::PriceAbove, dec!(60000)),
            state: AlertState::Armed,
        }
    }

    #[tokio::test]
    async fn inserts_and_lists_armed() {
        let repo = SqliteAlertRepository::new(pool().await);
        repo.insert(&sample()).await.unwrap();
        assert_eq!(repo.list_armed().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn duplicate_armed_fingerprint_conflicts() {
        let repo = SqliteAlertRepository::new(pool().await);
        repo.insert(&sample()).await.unwrap();
        let mut dup = sample();
        dup.id = "a2".into();
        let err = repo.insert(&dup).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict { .. }));
    }

    #[tokio::test]
    async fn dismissing_frees_the_fingerprint() {
        let repo = SqliteAlertRepository::new(pool().await);
        let mut alert = sample();
        repo.insert(&alert).await.unwrap();
        alert.state = AlertState::Dismissed;
        repo.update(&alert).await.unwrap();

        let mut rearmed = sample();
        rearmed.id = "a2".into();
        repo.insert(&rearmed).await.unwrap();
        assert_eq!(repo.list_armed().await.unwrap().len(), 1);
    }
}
