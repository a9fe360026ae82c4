//! Wires every subsystem into one `AppContext` (SPEC_FULL's Design Notes:
//! "introduce an explicit `AppContext` built once in `main`, passed down
//! explicitly; tests substitute fakes"). Generalizes the teacher's
//! `main.rs`/`Application` construction sequence (config -> database ->
//! repositories -> services -> background tasks) into one typed builder
//! `interfaces::http` and `src/bin/server.rs` both depend on.

use crate::application::accounting::PortfolioService;
use crate::application::ai::{AiService, ReqwestAiProvider};
use crate::application::alerts::{AlertEngine, OpportunityScanner};
use crate::application::risk::RiskEngine;
use crate::application::router::TradeRouter;
use crate::application::streaming::{Fanout, PriceTicker};
use crate::config::Config;
use crate::domain::ports::{
    AlertRepository, AuditRepository, NotificationRepository, PlatformRepository, PortfolioRepository,
    TradeRepository, UserRepository,
};
use crate::domain::quote::AssetClass;
use crate::infrastructure::circuit_breaker::CircuitBreakerRegistry;
use crate::infrastructure::http_client_factory::HttpClientFactory;
use crate::infrastructure::market_data::MarketDataAggregator;
use crate::infrastructure::market_data::sources::{CryptoSource, EquitySource, ForexSource, SyntheticSource};
use crate::infrastructure::observability::{Metrics, MetricsReporter};
use crate::infrastructure::persistence::Database;
use crate::infrastructure::persistence::repositories::{
    SqliteAlertRepository, SqliteAuditRepository, SqliteNotificationRepository, SqlitePlatformRepository,
    SqlitePortfolioRepository, SqliteTradeRepository, SqliteUserRepository,
};
use crate::infrastructure::vault::SecretVault;
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Default watchlist for the opportunity scanner; not user-configurable in
/// this version (spec §4.8 leaves the scan universe implementation-defined).
const OPPORTUNITY_WATCHLIST: &[&str] =
    &["BTCUSDT", "ETHUSDT", "SOLUSDT", "EURUSD", "GBPUSD", "AAPL", "MSFT"];
const OPPORTUNITY_MOVE_THRESHOLD_PCT: &str = "5";
const METRICS_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(60);
/// How often the assisted-mode approval queue is swept for lapsed TTLs
/// (spec §4.6 step 1's 5-minute default TTL; a minute-scale sweep keeps the
/// observed lapse close to the nominal TTL without busy-polling).
const APPROVAL_SWEEP_INTERVAL: Duration = Duration::from_secs(30);
/// How often every portfolio's `trading_day_start_balance`/`daily_pnl` rolls
/// forward and per-user hard-drawdown kill switches release (spec §4.5.3:
/// the freeze lasts "until next trading day", not permanently).
const TRADING_DAY_ROLL_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Every long-lived collaborator the interface layer needs, built once at
/// startup and handed down by reference (never rebuilt per-request).
pub struct AppContext {
    pub config: Config,
    pub db: Database,
    pub users: Arc<dyn UserRepository>,
    pub platforms: Arc<dyn PlatformRepository>,
    pub trades: Arc<dyn TradeRepository>,
    pub notifications: Arc<dyn NotificationRepository>,
    pub audit: Arc<dyn AuditRepository>,
    pub vault: Arc<SecretVault>,
    pub breakers: Arc<CircuitBreakerRegistry>,
    pub aggregator: Arc<MarketDataAggregator>,
    pub portfolios: Arc<PortfolioService>,
    pub risk: Arc<RiskEngine>,
    pub fanout: Arc<Fanout>,
    pub alerts: Arc<AlertEngine>,
    pub ai: Arc<AiService>,
    pub metrics: Metrics,
    pub router: Arc<TradeRouter>,
}

impl AppContext {
    pub async fn build(config: Config) -> Result<Self> {
        let db = Database::connect(&config.database.db_url).await.context("connecting to database")?;

        let users: Arc<dyn UserRepository> = Arc::new(SqliteUserRepository::new(db.pool.clone()));
        let platforms: Arc<dyn PlatformRepository> = Arc::new(SqlitePlatformRepository::new(db.pool.clone()));
        let trades: Arc<dyn TradeRepository> = Arc::new(SqliteTradeRepository::new(db.pool.clone()));
        let alert_repo: Arc<dyn AlertRepository> = Arc::new(SqliteAlertRepository::new(db.pool.clone()));
        let notifications: Arc<dyn NotificationRepository> = Arc::new(SqliteNotificationRepository::new(db.pool.clone()));
        let audit: Arc<dyn AuditRepository> = Arc::new(SqliteAuditRepository::new(db.pool.clone()));
        let portfolio_repo: Arc<dyn PortfolioRepository> = Arc::new(SqlitePortfolioRepository::new(db.pool.clone()));

        let vault = Arc::new(SecretVault::from_base64_key(&config.vault.vault_key_base64).context("loading secret vault key")?);

        let breakers = Arc::new(CircuitBreakerRegistry::default());

        let http_client = HttpClientFactory::create_client();
        let mut ranked_sources: HashMap<AssetClass, Vec<Arc<dyn crate::domain::ports::QuoteSource>>> = HashMap::new();
        ranked_sources.insert(
            AssetClass::Crypto,
            vec![Arc::new(CryptoSource::new(http_client.clone(), config.aggregator.crypto_source_url.clone()))],
        );
        if let (Some(api_key), Some(api_secret)) =
            (&config.aggregator.equity_source_api_key, &config.aggregator.equity_source_api_secret)
        {
            ranked_sources.insert(
                AssetClass::Stock,
                vec![Arc::new(EquitySource::new(
                    http_client.clone(),
                    config.aggregator.equity_source_url.clone(),
                    api_key.clone(),
                    api_secret.clone(),
                ))],
            );
        }
        ranked_sources.insert(
            AssetClass::Forex,
            vec![Arc::new(ForexSource::new(http_client.clone(), config.aggregator.forex_source_url.clone()))],
        );

        let aggregator = Arc::new(MarketDataAggregator::new(
            ranked_sources,
            Arc::new(SyntheticSource::new()),
            breakers.clone(),
            config.aggregator.as_aggregator_config(),
        ));

        let portfolios = Arc::new(PortfolioService::new(portfolio_repo, audit.clone()));
        let risk = Arc::new(RiskEngine::new(config.risk.limits.clone()));
        let fanout = Arc::new(Fanout::new());

        let alerts = Arc::new(AlertEngine::new(alert_repo, notifications.clone(), fanout.clone()));
        alerts.load_armed().await.context("loading armed alerts")?;

        let opportunity_scanner = Arc::new(OpportunityScanner::new(
            aggregator.clone(),
            fanout.clone(),
            OPPORTUNITY_WATCHLIST.iter().map(|s| s.to_string()).collect(),
            OPPORTUNITY_MOVE_THRESHOLD_PCT.parse().expect("literal constant parses"),
        ));
        opportunity_scanner.spawn();

        let price_ticker = Arc::new(PriceTicker::new(
            aggregator.clone(),
            fanout.clone(),
            alerts.clone(),
            OPPORTUNITY_WATCHLIST.iter().map(|s| s.to_string()).collect(),
        ));
        price_ticker.spawn();

        let ai_provider = config
            .ai_provider_key
            .as_ref()
            .map(|key| Arc::new(ReqwestAiProvider::new("https://api.openai.com/v1", key, "gpt-4o-mini")) as Arc<dyn crate::domain::ports::AiProvider>);
        let ai = Arc::new(AiService::new(ai_provider, breakers.clone()));

        let metrics = Metrics::new().context("registering prometheus metrics")?;
        if config.server.observability_enabled {
            let reporter = MetricsReporter::new(metrics.clone(), METRICS_HEARTBEAT_INTERVAL);
            tokio::spawn(reporter.run());
        }

        let router = Arc::new(TradeRouter::new(
            platforms.clone(),
            trades.clone(),
            notifications.clone(),
            audit.clone(),
            portfolios.clone(),
            risk.clone(),
            aggregator.clone(),
            breakers.clone(),
            vault.clone(),
            fanout.clone(),
            config.exchanges.clone(),
        ));

        {
            let router = router.clone();
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(APPROVAL_SWEEP_INTERVAL);
                loop {
                    ticker.tick().await;
                    router.expire_stale_approvals().await;
                }
            });
        }

        {
            let router = router.clone();
            let portfolios = portfolios.clone();
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(TRADING_DAY_ROLL_INTERVAL);
                ticker.tick().await; // first tick fires immediately; skip it, the day has not rolled yet
                loop {
                    ticker.tick().await;
                    portfolios.roll_all_trading_days().await;
                    router.release_daily_kill_switches().await;
                }
            });
        }

        info!("application context built");

        Ok(Self {
            config,
            db,
            users,
            platforms,
            trades,
            notifications,
            audit,
            vault,
            breakers,
            aggregator,
            portfolios,
            risk,
            fanout,
            alerts,
            ai,
            metrics,
            router,
        })
    }
}
