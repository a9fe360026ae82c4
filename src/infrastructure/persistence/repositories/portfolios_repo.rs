use crate::domain::errors::AppError;
use crate::domain::ports::PortfolioRepository;
use crate::domain::portfolio::Portfolio;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};

pub struct SqlitePortfolioRepository {
    pool: SqlitePool,
}

impl SqlitePortfolioRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn map_err(e: sqlx::Error) -> AppError {
    AppError::internal(format!("persistence error: {e}"))
}

fn parse_decimal(s: &str) -> Result<rust_decimal::Decimal, AppError> {
    s.parse().map_err(|_| AppError::internal(format!("corrupt decimal column: {s}")))
}

#[async_trait]
impl PortfolioRepository for SqlitePortfolioRepository {
    async fn get(&self, owner_id: &str) -> Result<Option<Portfolio>, AppError> {
        let row = sqlx::query("SELECT * FROM portfolios WHERE owner_id = ?")
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err)?;

        let Some(row) = row else { return Ok(None) };
        let positions_json: String = row.try_get("positions_json").map_err(map_err)?;
        let positions = serde_json::from_str(&positions_json)
            .map_err(|e| AppError::internal(format!("corrupt positions_json: {e}")))?;

        Ok(Some(Portfolio {
            owner_id: row.try_get("owner_id").map_err(map_err)?,
            total_balance: parse_decimal(&row.try_get::<String, _>("total_balance").map_err(map_err)?)?,
            available_balance: parse_decimal(&row.try_get::<String, _>("available_balance").map_err(map_err)?)?,
            invested_balance: parse_decimal(&row.try_get::<String, _>("invested_balance").map_err(map_err)?)?,
            daily_pnl: parse_decimal(&row.try_get::<String, _>("daily_pnl").map_err(map_err)?)?,
            total_pnl: parse_decimal(&row.try_get::<String, _>("total_pnl").map_err(map_err)?)?,
            positions,
            trading_day_start_balance: parse_decimal(
                &row.try_get::<String, _>("trading_day_start_balance").map_err(map_err)?,
            )?,
        }))
    }

    async fn upsert(&self, portfolio: &Portfolio) -> Result<(), AppError> {
        let positions_json = serde_json::to_string(&portfolio.positions)
            .map_err(|e| AppError::internal(format!("failed to serialize positions: {e}")))?;

        sqlx::query(
            r#"
            INSERT INTO portfolios (
                owner_id, total_balance, available_balance, invested_balance,
                daily_pnl, total_pnl, positions_json, trading_day_start_balance, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(owner_id) DO UPDATE SET
                total_balance = excluded.total_balance,
                available_balance = excluded.available_balance,
                invested_balance = excluded.invested_balance,
                daily_pnl = excluded.daily_pnl,
                total_pnl = excluded.total_pnl,
                positions_json = excluded.positions_json,
                trading_day_start_balance = excluded.trading_day_start_balance,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&portfolio.owner_id)
        .bind(portfolio.total_balance.to_string())
        .bind(portfolio.available_balance.to_string())
        .bind(portfolio.invested_balance.to_string())
        .bind(portfolio.daily_pnl.to_string())
        .bind(portfolio.total_pnl.to_string())
        .bind(positions_json)
        .bind(portfolio.trading_day_start_balance.to_string())
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(())
    }

    async fn list_owner_ids(&self) -> Result<Vec<String>, AppError> {
        let rows = sqlx::query("SELECT owner_id FROM portfolios").fetch_all(&self.pool).await.map_err(map_err)?;
        rows.into_iter().map(|row| row.try_get("owner_id").map_err(map_err)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new().connect("sqlite::memory:").await.unwrap();
        sqlx::query(
            r#"
            CREATE TABLE portfolios (
                owner_id TEXT PRIMARY KEY, total_balance TEXT NOT NULL, available_balance TEXT NOT NULL,
                invested_balance TEXT NOT NULL, daily_pnl TEXT NOT NULL, total_pnl TEXT NOT NULL,
                positions_json TEXT NOT NULL, trading_day_start_balance TEXT NOT NULL, updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await
        .unwrap();
        pool
    }

    #[tokio::test]
    async fn round_trips_through_upsert_and_get() {
        let repo = SqlitePortfolioRepository::new(pool().await);
        let portfolio = Portfolio::new("u1", dec!(10000));
        repo.upsert(&portfolio).await.unwrap();
        let found = repo.get("u1").await.unwrap().unwrap();
        assert_eq!(found.total_balance, dec!(10000));
    }

    #[tokio::test]
    async fn upsert_overwrites_existing_row() {
        let repo = SqlitePortfolioRepository::new(pool().await);
        let mut portfolio = Portfolio::new("u1", dec!(10000));
        repo.upsert(&portfolio).await.unwrap();
        portfolio.available_balance = dec!(9000);
        repo.upsert(&portfolio).await.unwrap();
        let found = repo.get("u1").await.unwrap().unwrap();
        assert_eq!(found.available_balance, dec!(9000));
    }

    #[tokio::test]
    async fn missing_portfolio_returns_none() {
        let repo = SqlitePortfolioRepository::new(pool().await);
        assert!(repo.get("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_owner_ids_reflects_every_upserted_portfolio() {
        let repo = SqlitePortfolioRepository::new(pool().await);
        repo.upsert(&Portfolio::new("u1", dec!(10000))).await.unwrap();
        repo.upsert(&Portfolio::new("u2", dec!(5000))).await.unwrap();
        let mut owners = repo.list_owner_ids().await.unwrap();
        owners.sort();
        assert_eq!(owners, vec!["u1".to_string(), "u2".to_string()]);
    }
}
