//! Trait boundaries between `application` orchestration and
//! `infrastructure` implementations (spec §6's "interface contracts").
//!
//! Generalizes the teacher's `domain::ports::{MarketDataService,
//! ExecutionService}` async-trait pattern to the full set of collaborators
//! this spec names.

use crate::domain::alert::SmartAlert;
use crate::domain::errors::AppError;
use crate::domain::notification::Notification;
use crate::domain::order::TradeOrder;
use crate::domain::platform::{Platform, PlatformCredentials};
use crate::domain::portfolio::Portfolio;
use crate::domain::quote::Quote;
use crate::domain::trade::Trade;
use crate::domain::user::User;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct AdapterTestResult {
    pub ok: bool,
    pub latency_ms: u64,
    pub balance_snapshot: Option<HashMap<String, Decimal>>,
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AssetBalance {
    pub free: Decimal,
    pub locked: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacedOrderStatus {
    Filled,
    PartiallyFilled,
    Accepted,
    Rejected,
}

#[derive(Debug, Clone)]
pub struct PlacedOrder {
    pub exchange_order_id: String,
    pub fill_price: Option<Decimal>,
    pub status: PlacedOrderStatus,
}

/// Uniform wire interface over one external exchange, live or sandbox (spec
/// §4.3). Implementations MUST translate upstream failures into `AppError`
/// variants from the taxonomy (never leak exchange-specific error types),
/// serialize concurrent calls per connection where the upstream requires
/// it, and never log credentials.
#[async_trait]
pub trait ExchangeAdapter: Send + Sync {
    async fn test(&self) -> Result<AdapterTestResult, AppError>;
    async fn balances(&self) -> Result<HashMap<String, AssetBalance>, AppError>;
    async fn ticker(&self, symbol: &str) -> Result<Quote, AppError>;
    async fn place_order(&self, order: &TradeOrder) -> Result<PlacedOrder, AppError>;
    async fn cancel(&self, exchange_order_id: &str) -> Result<(), AppError>;
    async fn order_status(&self, exchange_order_id: &str) -> Result<PlacedOrderStatus, AppError>;
}

/// One ranked market-data source consulted by the Aggregator (spec §4.2).
#[async_trait]
pub trait QuoteSource: Send + Sync {
    fn name(&self) -> &str;
    async fn fetch(&self, symbol: &str) -> Result<Quote, AppError>;
}

/// Opaque text-completion service with a timeout and fallback (spec §1/§7).
#[async_trait]
pub trait AiProvider: Send + Sync {
    async fn analyze(&self, prompt: &str) -> Result<String, AppError>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn insert(&self, user: &User) -> Result<(), AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError>;
    async fn update(&self, user: &User) -> Result<(), AppError>;
}

#[async_trait]
pub trait PortfolioRepository: Send + Sync {
    async fn get(&self, owner_id: &str) -> Result<Option<Portfolio>, AppError>;
    async fn upsert(&self, portfolio: &Portfolio) -> Result<(), AppError>;
    /// Every owner_id with a persisted portfolio, for the bootstrap
    /// day-boundary task to roll regardless of whether `PortfolioService`
    /// has cached that owner this process run.
    async fn list_owner_ids(&self) -> Result<Vec<String>, AppError>;
}

#[async_trait]
pub trait PlatformRepository: Send + Sync {
    async fn insert(&self, platform: &Platform) -> Result<(), AppError>;
    async fn find(&self, id: &str) -> Result<Option<Platform>, AppError>;
    async fn list_for_owner(&self, owner_id: &str) -> Result<Vec<Platform>, AppError>;
    async fn update(&self, platform: &Platform) -> Result<(), AppError>;
}

#[async_trait]
pub trait TradeRepository: Send + Sync {
    async fn insert(&self, trade: &Trade) -> Result<(), AppError>;
    async fn update(&self, trade: &Trade) -> Result<(), AppError>;
    async fn find(&self, id: &str) -> Result<Option<Trade>, AppError>;
    async fn find_by_idempotency_key(
        &self,
        owner_id: &str,
        key: &str,
    ) -> Result<Option<Trade>, AppError>;
    async fn list_for_owner(&self, owner_id: &str) -> Result<Vec<Trade>, AppError>;
    async fn list_open_for_owner(&self, owner_id: &str) -> Result<Vec<Trade>, AppError>;
}

#[async_trait]
pub trait AlertRepository: Send + Sync {
    async fn insert(&self, alert: &SmartAlert) -> Result<(), AppError>;
    async fn update(&self, alert: &SmartAlert) -> Result<(), AppError>;
    async fn delete(&self, id: &str) -> Result<(), AppError>;
    async fn list_for_owner(&self, owner_id: &str) -> Result<Vec<SmartAlert>, AppError>;
    async fn list_armed(&self) -> Result<Vec<SmartAlert>, AppError>;
}

#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn insert(&self, notification: &Notification) -> Result<(), AppError>;
    async fn list_for_owner(&self, owner_id: &str) -> Result<Vec<Notification>, AppError>;
}

#[async_trait]
pub trait AuditRepository: Send + Sync {
    async fn append(
        &self,
        actor: &str,
        action: &str,
        resource: &str,
        detail: serde_json::Value,
    ) -> Result<(), AppError>;
}

/// Resolves a platform's decrypted credentials, abstracting over the vault
/// so `application` code never touches ciphertext directly.
pub trait CredentialResolver: Send + Sync {
    fn decrypt(&self, ciphertext: &[u8]) -> Result<PlatformCredentials, AppError>;
    fn encrypt(&self, credentials: &PlatformCredentials) -> Result<Vec<u8>, AppError>;
}
