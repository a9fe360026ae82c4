//! In-memory fakes for the repository ports, shared across `tests/scenarios`
//! and `tests/risk` (SPEC_FULL §2's "Test tooling": integration-style tests
//! against fakes for the ports to exercise the Trade Router end-to-end).
//! Grounded on the equivalent fakes already co-located in
//! `application::router::mod::tests`, pulled out here since integration
//! tests cannot reach a `#[cfg(test)]` module private to the crate.

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex as AsyncMutex;
use vaultrade::application::accounting::PortfolioService;
use vaultrade::application::risk::RiskEngine;
use vaultrade::application::router::TradeRouter;
use vaultrade::application::streaming::Fanout;
use vaultrade::config::ExchangeEnvConfig;
use vaultrade::domain::errors::AppError;
use vaultrade::domain::mode::OperatingMode;
use vaultrade::domain::notification::Notification;
use vaultrade::domain::platform::{Platform, PlatformCredentials};
use vaultrade::domain::ports::{
    AuditRepository, CredentialResolver, NotificationRepository, PlatformRepository, PortfolioRepository,
    TradeRepository,
};
use vaultrade::domain::risk::RiskLimits;
use vaultrade::domain::trade::{Trade, TradeStatus};
use vaultrade::domain::user::{Role, TwoFactorState, User};
use vaultrade::infrastructure::circuit_breaker::CircuitBreakerRegistry;
use vaultrade::infrastructure::market_data::aggregator::{AggregatorConfig, MarketDataAggregator};
use vaultrade::infrastructure::market_data::sources::SyntheticSource;

pub struct FakeTradeRepo {
    rows: AsyncMutex<HashMap<String, Trade>>,
}

impl Default for FakeTradeRepo {
    fn default() -> Self {
        Self { rows: AsyncMutex::new(HashMap::new()) }
    }
}

#[async_trait]
impl TradeRepository for FakeTradeRepo {
    async fn insert(&self, trade: &Trade) -> Result<(), AppError> {
        self.rows.lock().await.insert(trade.id.clone(), trade.clone());
        Ok(())
    }
    async fn update(&self, trade: &Trade) -> Result<(), AppError> {
        self.rows.lock().await.insert(trade.id.clone(), trade.clone());
        Ok(())
    }
    async fn find(&self, id: &str) -> Result<Option<Trade>, AppError> {
        Ok(self.rows.lock().await.get(id).cloned())
    }
    async fn find_by_idempotency_key(&self, owner_id: &str, key: &str) -> Result<Option<Trade>, AppError> {
        Ok(self
            .rows
            .lock()
            .await
            .values()
            .find(|t| t.owner_id == owner_id && t.idempotency_key.as_deref() == Some(key))
            .cloned())
    }
    async fn list_for_owner(&self, owner_id: &str) -> Result<Vec<Trade>, AppError> {
        Ok(self.rows.lock().await.values().filter(|t| t.owner_id == owner_id).cloned().collect())
    }
    async fn list_open_for_owner(&self, owner_id: &str) -> Result<Vec<Trade>, AppError> {
        Ok(self
            .rows
            .lock()
            .await
            .values()
            .filter(|t| t.owner_id == owner_id && t.status == TradeStatus::Open)
            .cloned()
            .collect())
    }
}

pub struct FakePlatformRepo;

#[async_trait]
impl PlatformRepository for FakePlatformRepo {
    async fn insert(&self, _platform: &Platform) -> Result<(), AppError> {
        Ok(())
    }
    async fn find(&self, _id: &str) -> Result<Option<Platform>, AppError> {
        Ok(None)
    }
    async fn list_for_owner(&self, _owner_id: &str) -> Result<Vec<Platform>, AppError> {
        Ok(Vec::new())
    }
    async fn update(&self, _platform: &Platform) -> Result<(), AppError> {
        Ok(())
    }
}

pub struct FakeNotificationRepo {
    pub rows: AsyncMutex<Vec<Notification>>,
}

impl Default for FakeNotificationRepo {
    fn default() -> Self {
        Self { rows: AsyncMutex::new(Vec::new()) }
    }
}

#[async_trait]
impl NotificationRepository for FakeNotificationRepo {
    async fn insert(&self, notification: &Notification) -> Result<(), AppError> {
        self.rows.lock().await.push(notification.clone());
        Ok(())
    }
    async fn list_for_owner(&self, owner_id: &str) -> Result<Vec<Notification>, AppError> {
        Ok(self.rows.lock().await.iter().filter(|n| n.owner_id == owner_id).cloned().collect())
    }
}

pub struct FakeAuditRepo;

#[async_trait]
impl AuditRepository for FakeAuditRepo {
    async fn append(&self, _actor: &str, _action: &str, _resource: &str, _detail: serde_json::Value) -> Result<(), AppError> {
        Ok(())
    }
}

pub struct FakePortfolioRepo {
    pub rows: AsyncMutex<HashMap<String, vaultrade::domain::portfolio::Portfolio>>,
}

impl Default for FakePortfolioRepo {
    fn default() -> Self {
        Self { rows: AsyncMutex::new(HashMap::new()) }
    }
}

#[async_trait]
impl PortfolioRepository for FakePortfolioRepo {
    async fn get(&self, owner_id: &str) -> Result<Option<vaultrade::domain::portfolio::Portfolio>, AppError> {
        Ok(self.rows.lock().await.get(owner_id).cloned())
    }
    async fn upsert(&self, portfolio: &vaultrade::domain::portfolio::Portfolio) -> Result<(), AppError> {
        self.rows.lock().await.insert(portfolio.owner_id.clone(), portfolio.clone());
        Ok(())
    }
    async fn list_owner_ids(&self) -> Result<Vec<String>, AppError> {
        Ok(self.rows.lock().await.keys().cloned().collect())
    }
}

pub struct NullCredentials;

impl CredentialResolver for NullCredentials {
    fn decrypt(&self, _ciphertext: &[u8]) -> Result<PlatformCredentials, AppError> {
        Ok(PlatformCredentials { api_key: String::new(), secret_key: String::new(), passphrase: None })
    }
    fn encrypt(&self, _credentials: &PlatformCredentials) -> Result<Vec<u8>, AppError> {
        Ok(Vec::new())
    }
}

pub fn user(id: &str, mode: OperatingMode) -> User {
    User {
        id: id.to_string(),
        email: format!("{id}@example.com"),
        username: id.to_string(),
        password_hash: String::new(),
        role: Role::User,
        two_factor: TwoFactorState::default(),
        mode,
        created_at: Utc::now(),
    }
}

/// Everything a scenario test needs: the router under test plus handles to
/// the fakes behind it, so assertions can inspect state the router's public
/// API doesn't expose directly (portfolio balances, persisted trades,
/// emitted notifications).
pub struct Harness {
    pub router: TradeRouter,
    pub portfolios: Arc<PortfolioService>,
    pub trades: Arc<FakeTradeRepo>,
    pub notifications: Arc<FakeNotificationRepo>,
}

/// A `TradeRouter` with every port faked in-memory, seeded with a
/// `$10,000` portfolio for `owner_id`. Mirrors
/// `application::router::mod::tests::router_with_seeded_portfolio`, pulled
/// out to an integration-test-visible helper.
pub async fn router_with_seeded_portfolio(owner_id: &str) -> Harness {
    router_with_portfolio(vaultrade::domain::portfolio::Portfolio::new(owner_id, dec!(10000))).await
}

/// Like `router_with_seeded_portfolio`, but the caller supplies the exact
/// starting `Portfolio` (e.g. one already in breach of a risk limit) instead
/// of a freshly-seeded one. The portfolio is written straight to the fake
/// repository before `PortfolioService` ever caches it, so it is what the
/// first `snapshot`/`submit_order` call observes.
pub async fn router_with_portfolio(portfolio: vaultrade::domain::portfolio::Portfolio) -> Harness {
    let owner_id = portfolio.owner_id.clone();
    let portfolio_repo = Arc::new(FakePortfolioRepo::default());
    portfolio_repo.rows.lock().await.insert(owner_id.clone(), portfolio);
    let audit: Arc<dyn AuditRepository> = Arc::new(FakeAuditRepo);
    let portfolios = Arc::new(PortfolioService::new(portfolio_repo, audit.clone()));

    let aggregator = Arc::new(MarketDataAggregator::new(
        HashMap::new(),
        Arc::new(SyntheticSource::new()),
        Arc::new(CircuitBreakerRegistry::default()),
        AggregatorConfig::default(),
    ));

    let trades = Arc::new(FakeTradeRepo::default());
    let notifications = Arc::new(FakeNotificationRepo::default());

    let router = TradeRouter::new(
        Arc::new(FakePlatformRepo),
        trades.clone(),
        notifications.clone(),
        audit,
        portfolios.clone(),
        Arc::new(RiskEngine::new(RiskLimits::default())),
        aggregator,
        Arc::new(CircuitBreakerRegistry::default()),
        Arc::new(NullCredentials),
        Arc::new(Fanout::new()),
        ExchangeEnvConfig::from_env().unwrap(),
    );

    Harness { router, portfolios, trades, notifications }
}
