use crate::domain::errors::AppError;
use crate::domain::order::{OrderSide, OrderType};
use crate::domain::ports::TradeRepository;
use crate::domain::trade::{ExecutionKind, Trade, TradeStatus};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Row, SqlitePool, sqlite::SqliteRow};
use std::str::FromStr;

pub struct SqliteTradeRepository {
    pool: SqlitePool,
}

impl SqliteTradeRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn map_err(e: sqlx::Error) -> AppError {
    AppError::internal(format!("persistence error: {e}"))
}

fn parse_decimal(s: &str) -> Result<Decimal, AppError> {
    s.parse().map_err(|_| AppError::internal(format!("corrupt decimal column: {s}")))
}

fn parse_opt_decimal(s: Option<String>) -> Result<Option<Decimal>, AppError> {
    s.map(|s| parse_decimal(&s)).transpose()
}

fn side_from_str(s: &str) -> OrderSide {
    if s == "sell" { OrderSide::Sell } else { OrderSide::Buy }
}

fn order_type_from_str(s: &str) -> OrderType {
    match s {
        "limit" => OrderType::Limit,
        "stop_loss" => OrderType::StopLoss,
        "take_profit" => OrderType::TakeProfit,
        _ => OrderType::Market,
    }
}

fn status_from_str(s: &str) -> TradeStatus {
    match s {
        "closed" => TradeStatus::Closed,
        "cancelled" => TradeStatus::Cancelled,
        _ => TradeStatus::Open,
    }
}

fn status_to_str(status: TradeStatus) -> &'static str {
    match status {
        TradeStatus::Open => "open",
        TradeStatus::Closed => "closed",
        TradeStatus::Cancelled => "cancelled",
    }
}

fn execution_kind_from_str(s: &str) -> ExecutionKind {
    if s == "live" { ExecutionKind::Live } else { ExecutionKind::Paper }
}

fn row_to_trade(row: SqliteRow) -> Result<Trade, AppError> {
    let created_at: String = row.try_get("created_at").map_err(map_err)?;
    let closed_at: Option<String> = row.try_get("closed_at").map_err(map_err)?;
    Ok(Trade {
        id: row.try_get("id").map_err(map_err)?,
        owner_id: row.try_get("owner_id").map_err(map_err)?,
        platform_id: row.try_get("platform_id").map_err(map_err)?,
        symbol: row.try_get("symbol").map_err(map_err)?,
        side: side_from_str(&row.try_get::<String, _>("side").map_err(map_err)?),
        order_type: order_type_from_str(&row.try_get::<String, _>("order_type").map_err(map_err)?),
        quantity: parse_decimal(&row.try_get::<String, _>("quantity").map_err(map_err)?)?,
        entry_price: parse_decimal(&row.try_get::<String, _>("entry_price").map_err(map_err)?)?,
        exit_price: parse_opt_decimal(row.try_get("exit_price").map_err(map_err)?)?,
        stop_loss: parse_opt_decimal(row.try_get("stop_loss").map_err(map_err)?)?,
        take_profit: parse_opt_decimal(row.try_get("take_profit").map_err(map_err)?)?,
        status: status_from_str(&row.try_get::<String, _>("status").map_err(map_err)?),
        pnl: parse_decimal(&row.try_get::<String, _>("pnl").map_err(map_err)?)?,
        execution_kind: execution_kind_from_str(&row.try_get::<String, _>("execution_kind").map_err(map_err)?),
        market_price_at_execution: parse_decimal(
            &row.try_get::<String, _>("market_price_at_execution").map_err(map_err)?,
        )?,
        exchange_order_id: row.try_get("exchange_order_id").map_err(map_err)?,
        idempotency_key: row.try_get("idempotency_key").map_err(map_err)?,
        created_at: DateTime::<Utc>::from_str(&created_at)
            .map_err(|e| AppError::internal(format!("corrupt created_at: {e}")))?,
        closed_at: closed_at
            .map(|s| DateTime::<Utc>::from_str(&s))
            .transpose()
            .map_err(|e| AppError::internal(format!("corrupt closed_at: {e}")))?,
    })
}

#[async_trait]
impl TradeRepository for SqliteTradeRepository {
    async fn insert(&self, trade: &Trade) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO trades (
                id, owner_id, platform_id, symbol, side, order_type, quantity, entry_price,
                exit_price, stop_loss, take_profit, status, pnl, execution_kind,
                market_price_at_execution, exchange_order_id, idempotency_key, created_at, closed_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&trade.id)
        .bind(&trade.owner_id)
        .bind(&trade.platform_id)
        .bind(&trade.symbol)
        .bind(if trade.side == OrderSide::Sell { "sell" } else { "buy" })
        .bind(match trade.order_type {
            OrderType::Limit => "limit",
            OrderType::StopLoss => "stop_loss",
            OrderType::TakeProfit => "take_profit",
            OrderType::Market => "market",
        })
        .bind(trade.quantity.to_string())
        .bind(trade.entry_price.to_string())
        .bind(trade.exit_price.map(|d| d.to_string()))
        .bind(trade.stop_loss.map(|d| d.to_string()))
        .bind(trade.take_profit.map(|d| d.to_string()))
        .bind(status_to_str(trade.status))
        .bind(trade.pnl.to_string())
        .bind(if trade.execution_kind == ExecutionKind::Live { "live" } else { "paper" })
        .bind(trade.market_price_at_execution.to_string())
        .bind(&trade.exchange_order_id)
        .bind(&trade.idempotency_key)
        .bind(trade.created_at.to_rfc3339())
        .bind(trade.closed_at.map(|t| t.to_rfc3339()))
        .execute(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(())
    }

    async fn update(&self, trade: &Trade) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE trades SET
                exit_price = ?, stop_loss = ?, take_profit = ?, status = ?, pnl = ?,
                exchange_order_id = ?, closed_at = ?
            WHERE id = ?
            "#,
        )
        .bind(trade.exit_price.map(|d| d.to_string()))
        .bind(trade.stop_loss.map(|d| d.to_string()))
        .bind(trade.take_profit.map(|d| d.to_string()))
        .bind(status_to_str(trade.status))
        .bind(trade.pnl.to_string())
        .bind(&trade.exchange_order_id)
        .bind(trade.closed_at.map(|t| t.to_rfc3339()))
        .bind(&trade.id)
        .execute(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(())
    }

    async fn find(&self, id: &str) -> Result<Option<Trade>, AppError> {
        let row = sqlx::query("SELECT * FROM trades WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err)?;
        row.map(row_to_trade).transpose()
    }

    async fn find_by_idempotency_key(&self, owner_id: &str, key: &str) -> Result<Option<Trade>, AppError> {
        let row = sqlx::query("SELECT * FROM trades WHERE owner_id = ? AND idempotency_key = ?")
            .bind(owner_id)
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err)?;
        row.map(row_to_trade).transpose()
    }

    async fn list_for_owner(&self, owner_id: &str) -> Result<Vec<Trade>, AppError> {
        let rows = sqlx::query("SELECT * FROM trades WHERE owner_id = ? ORDER BY created_at DESC")
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await
            .map_err(map_err)?;
        rows.into_iter().map(row_to_trade).collect()
    }

    async fn list_open_for_owner(&self, owner_id: &str) -> Result<Vec<Trade>, AppError> {
        let rows = sqlx::query("SELECT * FROM trades WHERE owner_id = ? AND status = 'open' ORDER BY created_at")
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await
            .map_err(map_err)?;
        rows.into_iter().map(row_to_trade).collect()
    }
}
