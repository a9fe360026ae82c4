//! Explicit DTOs for the HTTP boundary (Design Notes: "introduce an
//! explicit DTO boundary... no internal error type's Debug output (or,
//! generalized here, no internal storage/domain type) ever reaches a
//! client unfiltered"). Every handler response is built from one of these,
//! never a bare domain or storage type serialized directly.

use crate::domain::alert::{AlertCondition, AlertState, SmartAlert};
use crate::domain::notification::Notification;
use crate::domain::order::{OrderSide, OrderType};
use crate::domain::platform::{Platform, PlatformKind, PlatformStatus};
use crate::domain::portfolio::{Portfolio, Position, PositionSide};
use crate::domain::ports::AdapterTestResult;
use crate::domain::quote::Quote;
use crate::domain::trade::{ExecutionKind, Trade, TradeStatus};
use crate::domain::user::User;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ── Auth ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub access_token: String,
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub totp: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
}

// ── Portfolio ────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct PositionDto {
    pub symbol: String,
    pub quantity: Decimal,
    pub average_price: Decimal,
    pub side: PositionSide,
}

#[derive(Debug, Serialize)]
pub struct PortfolioResponse {
    pub total_balance: Decimal,
    pub available_balance: Decimal,
    pub invested_balance: Decimal,
    pub daily_pnl: Decimal,
    pub total_pnl: Decimal,
    pub positions: Vec<PositionDto>,
}

impl From<Portfolio> for PortfolioResponse {
    fn from(p: Portfolio) -> Self {
        let positions = p
            .positions
            .into_iter()
            .map(|(symbol, pos): (String, Position)| PositionDto {
                symbol,
                quantity: pos.quantity,
                average_price: pos.average_price,
                side: pos.side,
            })
            .collect();
        Self {
            total_balance: p.total_balance,
            available_balance: p.available_balance,
            invested_balance: p.invested_balance,
            daily_pnl: p.daily_pnl,
            total_pnl: p.total_pnl,
            positions,
        }
    }
}

// ── Trades ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct TradeRequest {
    pub symbol: String,
    pub side: OrderSide,
    pub order_type: OrderType,
    pub quantity: Decimal,
    #[serde(default)]
    pub limit_price: Option<Decimal>,
    #[serde(default)]
    pub stop_loss: Option<Decimal>,
    #[serde(default)]
    pub take_profit: Option<Decimal>,
    #[serde(default)]
    pub platform_id: Option<String>,
    #[serde(default)]
    pub idempotency_key: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TradeResponse {
    pub id: String,
    pub symbol: String,
    pub side: OrderSide,
    pub order_type: OrderType,
    pub quantity: Decimal,
    pub entry_price: Decimal,
    pub exit_price: Option<Decimal>,
    pub stop_loss: Option<Decimal>,
    pub take_profit: Option<Decimal>,
    pub status: TradeStatus,
    pub pnl: Decimal,
    pub execution_kind: ExecutionKind,
    pub market_price_at_execution: Decimal,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

impl From<Trade> for TradeResponse {
    fn from(t: Trade) -> Self {
        Self {
            id: t.id,
            symbol: t.symbol,
            side: t.side,
            order_type: t.order_type,
            quantity: t.quantity,
            entry_price: t.entry_price,
            exit_price: t.exit_price,
            stop_loss: t.stop_loss,
            take_profit: t.take_profit,
            status: t.status,
            pnl: t.pnl,
            execution_kind: t.execution_kind,
            market_price_at_execution: t.market_price_at_execution,
            created_at: t.created_at,
            closed_at: t.closed_at,
        }
    }
}

/// A submission that did not immediately produce an executed trade
/// (`LearningOnly`/`Assisted` modes) — the response shape is a tagged union
/// mirroring `application::router::SubmissionOutcome` one-for-one.
#[derive(Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SubmissionResponse {
    Recorded { message: String },
    PendingApproval { approval_id: String, expires_at: DateTime<Utc> },
    Executed(TradeResponse),
}

#[derive(Debug, Deserialize)]
pub struct ApprovalActionRequest {
    pub approval_id: String,
}

// ── Platforms ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct PlatformRequest {
    pub name: String,
    pub kind: PlatformKind,
    pub api_key: String,
    pub secret_key: String,
    #[serde(default)]
    pub passphrase: Option<String>,
    #[serde(default)]
    pub is_sandbox: bool,
}

#[derive(Debug, Serialize)]
pub struct PlatformResponse {
    pub id: String,
    pub name: String,
    pub kind: PlatformKind,
    pub is_sandbox: bool,
    pub is_default: bool,
    pub status: PlatformStatus,
    pub last_tested_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<Platform> for PlatformResponse {
    fn from(p: Platform) -> Self {
        Self {
            id: p.id,
            name: p.name,
            kind: p.kind,
            is_sandbox: p.is_sandbox,
            is_default: p.is_default,
            status: p.status,
            last_tested_at: p.last_tested_at,
            created_at: p.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PlatformTestResponse {
    pub ok: bool,
    pub latency_ms: u64,
    pub balance_snapshot: Option<HashMap<String, Decimal>>,
    pub error: Option<String>,
}

impl From<AdapterTestResult> for PlatformTestResponse {
    fn from(r: AdapterTestResult) -> Self {
        Self { ok: r.ok, latency_ms: r.latency_ms, balance_snapshot: r.balance_snapshot, error: r.error }
    }
}

// ── Market data ──────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct QuoteResponse {
    pub symbol: String,
    pub price: Decimal,
    pub change_24h_pct: Decimal,
    pub volume_24h: Decimal,
    pub high_24h: Decimal,
    pub low_24h: Decimal,
    pub source_tag: String,
    pub fetched_at: DateTime<Utc>,
}

impl From<Quote> for QuoteResponse {
    fn from(q: Quote) -> Self {
        Self {
            symbol: q.symbol,
            price: q.price,
            change_24h_pct: q.change_24h_pct,
            volume_24h: q.volume_24h,
            high_24h: q.high_24h,
            low_24h: q.low_24h,
            source_tag: q.source_tag,
            fetched_at: q.fetched_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct QuotesQuery {
    pub symbols: String,
}

// ── Alerts ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AlertRequest {
    pub symbol: String,
    pub condition: AlertCondition,
    pub threshold: Decimal,
}

#[derive(Debug, Serialize)]
pub struct AlertResponse {
    pub id: String,
    pub symbol: String,
    pub condition: AlertCondition,
    pub threshold: Decimal,
    pub state: AlertState,
}

impl From<SmartAlert> for AlertResponse {
    fn from(a: SmartAlert) -> Self {
        Self { id: a.id, symbol: a.symbol, condition: a.condition, threshold: a.threshold, state: a.state }
    }
}

// ── Notifications (used by the WebSocket frames, not a REST route) ───────

#[derive(Debug, Serialize)]
pub struct NotificationDto {
    pub id: String,
    pub kind: String,
    pub body: String,
    pub priority: String,
    pub created_at: DateTime<Utc>,
}

impl From<Notification> for NotificationDto {
    fn from(n: Notification) -> Self {
        Self {
            id: n.id,
            kind: format!("{:?}", n.kind),
            body: n.body,
            priority: format!("{:?}", n.priority),
            created_at: n.created_at,
        }
    }
}

// ── Misc ─────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct UserSummary {
    pub id: String,
    pub email: String,
    pub username: String,
}

impl From<&User> for UserSummary {
    fn from(u: &User) -> Self {
        Self { id: u.id.clone(), email: u.email.clone(), username: u.username.clone() }
    }
}
