//! Trade Router (spec §4.6) — the gated order-submission pipeline. Mode
//! selection, platform choice, and the lettered gating steps a–g are
//! implemented here as one state machine per submission, generalizing the
//! teacher's channel-fed `application/agents/executor.rs` (idempotency
//! pre-persist before calling out, optimistic portfolio update on success,
//! status rewritten to reflect the outcome) into a request/response path
//! with an explicit per-user lock instead of a single shared mpsc queue —
//! this spec needs concurrent, independent per-user submission rather than
//! one global order stream.

pub mod approval;
pub mod state;

use crate::application::accounting::PortfolioService;
use crate::application::risk::RiskEngine;
use crate::application::router::approval::{ApprovalQueue, PendingApproval};
use crate::application::router::state::SubmissionState;
use crate::application::streaming::{Fanout, SystemEvent};
use crate::config::ExchangeEnvConfig;
use crate::domain::errors::AppError;
use crate::domain::mode::OperatingMode;
use crate::domain::notification::{Notification, NotificationKind, Priority};
use crate::domain::order::{OrderSide, OrderType, TradeOrder};
use crate::domain::platform::{Platform, PlatformKind, PlatformStatus};
use crate::domain::ports::{
    AuditRepository, CredentialResolver, ExchangeAdapter, NotificationRepository, PlatformRepository,
    TradeRepository,
};
use crate::domain::risk::RiskVerdict;
use crate::domain::trade::{ExecutionKind, Trade, TradeStatus};
use crate::domain::user::User;
use crate::infrastructure::adapters::ExchangeAdapterHandle;
use crate::infrastructure::circuit_breaker::{BreakerDecision, CircuitBreakerRegistry};
use crate::infrastructure::market_data::MarketDataAggregator;
use chrono::{Duration as ChronoDuration, Utc};
use dashmap::DashMap;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex as AsyncMutex;
use tracing::{info, instrument, warn};

/// Pre-submission freshness bound (spec §4.6 step d).
const QUOTE_FRESHNESS_LIMIT_SECS: i64 = 5;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SubmissionOutcome {
    /// `LearningOnly`: scored against the Risk Engine but never submitted.
    Recorded { message: String },
    /// `Assisted`: enqueued until the user approves or the TTL lapses.
    PendingApproval { approval_id: String, expires_at: chrono::DateTime<Utc> },
    Executed(Trade),
}

pub struct TradeRouter {
    platforms: Arc<dyn PlatformRepository>,
    trades: Arc<dyn TradeRepository>,
    notifications: Arc<dyn NotificationRepository>,
    audit: Arc<dyn AuditRepository>,
    portfolios: Arc<PortfolioService>,
    risk: Arc<RiskEngine>,
    aggregator: Arc<MarketDataAggregator>,
    breakers: Arc<CircuitBreakerRegistry>,
    credentials: Arc<dyn CredentialResolver>,
    fanout: Arc<Fanout>,
    exchanges: ExchangeEnvConfig,
    locks: DashMap<String, Arc<AsyncMutex<()>>>,
    approvals: ApprovalQueue,
    kill_switch_global: AtomicBool,
    kill_switch_users: DashMap<String, ()>,
}

impl TradeRouter {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        platforms: Arc<dyn PlatformRepository>,
        trades: Arc<dyn TradeRepository>,
        notifications: Arc<dyn NotificationRepository>,
        audit: Arc<dyn AuditRepository>,
        portfolios: Arc<PortfolioService>,
        risk: Arc<RiskEngine>,
        aggregator: Arc<MarketDataAggregator>,
        breakers: Arc<CircuitBreakerRegistry>,
        credentials: Arc<dyn CredentialResolver>,
        fanout: Arc<Fanout>,
        exchanges: ExchangeEnvConfig,
    ) -> Self {
        Self {
            platforms,
            trades,
            notifications,
            audit,
            portfolios,
            risk,
            aggregator,
            breakers,
            credentials,
            fanout,
            exchanges,
            locks: DashMap::new(),
            approvals: ApprovalQueue::default(),
            kill_switch_global: AtomicBool::new(false),
            kill_switch_users: DashMap::new(),
        }
    }

    /// Override the assisted-mode approval TTL (default 5 minutes). Exists
    /// for integration tests that need to observe expiry without a
    /// real-time wait; production call sites never call this.
    pub fn with_approval_ttl(mut self, ttl: std::time::Duration) -> Self {
        self.approvals = ApprovalQueue::new(ttl);
        self
    }

    pub fn global_kill_switch_engaged(&self) -> bool {
        self.kill_switch_global.load(Ordering::SeqCst)
    }

    pub fn user_kill_switch_engaged(&self, owner_id: &str) -> bool {
        self.kill_switch_users.contains_key(owner_id)
    }

    pub async fn trip_global_kill_switch(&self, actor: &str) {
        self.kill_switch_global.store(true, Ordering::SeqCst);
        let _ = self.audit.append(actor, "kill_switch.tripped", "global", json!({})).await;
        warn!(actor, "global kill switch engaged");
    }

    pub async fn release_global_kill_switch(&self, actor: &str) {
        self.kill_switch_global.store(false, Ordering::SeqCst);
        let _ = self.audit.append(actor, "kill_switch.released", "global", json!({})).await;
        info!(actor, "global kill switch released");
    }

    /// Clears every per-user hard-drawdown kill switch tripped by
    /// `enforce_hard_drawdown`. Spec §4.5.3 freezes trading "until next
    /// trading day", not permanently; called by the bootstrap day-boundary
    /// task alongside `PortfolioService::roll_all_trading_days`.
    pub async fn release_daily_kill_switches(&self) {
        let owners: Vec<String> = self.kill_switch_users.iter().map(|e| e.key().clone()).collect();
        self.kill_switch_users.clear();
        for owner_id in owners {
            let _ = self.audit.append(&owner_id, "kill_switch.day_rolled", &owner_id, json!({})).await;
            info!(owner_id, "per-user hard drawdown kill switch released for new trading day");
        }
    }

    pub fn pending_approvals_for(&self, owner_id: &str) -> Vec<PendingApproval> {
        self.approvals.list_for_owner(owner_id)
    }

    /// Swept on a schedule by the bootstrap background loop. Every expired
    /// approval is cancelled and the owner notified (spec §5: "The
    /// Assisted-mode approval queue has a TTL; expiry is a cancellation
    /// that never reaches the adapter").
    pub async fn expire_stale_approvals(&self) {
        for approval in self.approvals.expire_stale() {
            let notification = Notification::new(
                &approval.owner_id,
                NotificationKind::System,
                format!("order for {} expired waiting for approval", approval.order.symbol),
                Priority::Medium,
            );
            let _ = self.notifications.insert(&notification).await;
            self.fanout.publish_notification(&approval.owner_id, notification);
            let _ = self
                .audit
                .append(&approval.owner_id, "approval.expired", &approval.id, json!({"symbol": approval.order.symbol}))
                .await;
        }
    }

    async fn lock_for(&self, owner_id: &str) -> Arc<AsyncMutex<()>> {
        self.locks.entry(owner_id.to_string()).or_insert_with(|| Arc::new(AsyncMutex::new(()))).clone()
    }

    /// Submit a proposed order through mode selection and (for `Autopilot`
    /// or an approved `Assisted` order) the gated pipeline (spec §4.6).
    #[instrument(skip(self, user, order), fields(owner_id = %user.id, symbol = %order.symbol))]
    pub async fn submit_order(&self, user: &User, order: TradeOrder) -> Result<SubmissionOutcome, AppError> {
        if self.kill_switch_global.load(Ordering::SeqCst) || self.kill_switch_users.contains_key(&user.id) {
            return Err(AppError::forbidden("trading is currently halted by the kill switch"));
        }

        order.validate().map_err(AppError::validation)?;

        if let Some(key) = &order.idempotency_key
            && let Some(existing) = self.trades.find_by_idempotency_key(&user.id, key).await?
        {
            return Ok(SubmissionOutcome::Executed(existing));
        }

        match user.mode {
            OperatingMode::LearningOnly => {
                let verdict = self.score_only(user, &order).await?;
                let message = match verdict {
                    RiskVerdict::Allow => "order recorded and would have been allowed".to_string(),
                    RiskVerdict::Reduce { advisory_max_quantity, .. } => {
                        format!("order recorded; risk engine would reduce quantity to {advisory_max_quantity}")
                    }
                    RiskVerdict::Deny { reason } => format!("order recorded; risk engine would deny: {reason}"),
                };
                self.audit.append(&user.id, "trade.learning_recorded", &order.symbol, json!({"message": message})).await?;
                Ok(SubmissionOutcome::Recorded { message })
            }
            OperatingMode::Assisted => {
                let approval = self.approvals.enqueue(&user.id, order);
                self.audit
                    .append(&user.id, "approval.enqueued", &approval.id, json!({"symbol": approval.order.symbol}))
                    .await?;
                Ok(SubmissionOutcome::PendingApproval { approval_id: approval.id, expires_at: approval.expires_at })
            }
            OperatingMode::Autopilot => {
                let trade = self.execute_pipeline(user, order).await?;
                Ok(SubmissionOutcome::Executed(trade))
            }
        }
    }

    /// Approve a pending `Assisted`-mode order, running it through the same
    /// gated pipeline an `Autopilot` order takes.
    pub async fn approve_pending(&self, user: &User, approval_id: &str) -> Result<Trade, AppError> {
        let approval = self
            .approvals
            .take(&user.id, approval_id)
            .ok_or_else(|| AppError::not_found("no such pending approval"))?;
        self.audit.append(&user.id, "approval.granted", approval_id, json!({})).await?;
        self.execute_pipeline(user, approval.order).await
    }

    pub async fn reject_pending(&self, user: &User, approval_id: &str) -> Result<(), AppError> {
        self.approvals.take(&user.id, approval_id).ok_or_else(|| AppError::not_found("no such pending approval"))?;
        self.audit.append(&user.id, "approval.rejected", approval_id, json!({})).await?;
        Ok(())
    }

    /// Risk-score an order without submitting it (`LearningOnly` path).
    /// Triggers the hard-drawdown kill switch exactly like the real
    /// pipeline would, since a learning user's portfolio can still breach
    /// the hard limit from prior real trades.
    async fn score_only(&self, user: &User, order: &TradeOrder) -> Result<RiskVerdict, AppError> {
        let portfolio = self.portfolios.snapshot(&user.id).await?;
        self.enforce_hard_drawdown(user, &portfolio).await?;
        let quote = self.aggregator.get_quote(&order.symbol).await?;
        let open_trades = self.trades.list_open_for_owner(&user.id).await?;
        Ok(self.risk.evaluate(order, &portfolio, &quote, &open_trades))
    }

    /// Gated submission, steps a–g of spec §4.6.
    #[instrument(skip(self, user, order), fields(owner_id = %user.id, symbol = %order.symbol))]
    async fn execute_pipeline(&self, user: &User, order: TradeOrder) -> Result<Trade, AppError> {
        let mut state = SubmissionState::Proposing;
        info!(%state, "submission proposing");

        // a. per-user submission lock.
        let lock = self.lock_for(&user.id).await;
        let _guard = lock.lock().await;

        let portfolio = self.portfolios.snapshot(&user.id).await?;
        self.enforce_hard_drawdown(user, &portfolio).await?;

        // b. consult risk engine.
        state = SubmissionState::RiskChecking;
        info!(%state, "submission risk checking");
        let open_trades = self.trades.list_open_for_owner(&user.id).await?;
        let quote_for_sizing = self.aggregator.get_quote(&order.symbol).await?;
        let verdict = self.risk.evaluate(&order, &portfolio, &quote_for_sizing, &open_trades);
        let mut order = order;
        match verdict {
            RiskVerdict::Deny { reason } => {
                info!(state = %SubmissionState::Rejected, reason, "denied by risk engine");
                return Err(AppError::risk_denied(reason));
            }
            RiskVerdict::Reduce { new_quantity, .. } => {
                order.quantity = new_quantity;
            }
            RiskVerdict::Allow => {}
        }

        // c. breaker checks ahead of the exchange call.
        state = SubmissionState::BreakerChecking;
        info!(%state, "submission breaker checking");
        for key in ["exchange_api", "trade_execution"] {
            if let BreakerDecision::Reject { retry_after_secs } = self.breakers.get_or_create(key).check() {
                info!(state = %SubmissionState::Rejected, breaker = key, "rejected by open breaker");
                return Err(AppError::breaker_open(key, retry_after_secs));
            }
        }

        // d. fresh quote, auto-trip on stale data.
        let quote = self.fresh_quote(&order.symbol).await?;

        let platform = self.select_platform(&user.id, order.platform_id.as_deref()).await?;
        let execution_kind = if platform.kind.is_live() { ExecutionKind::Live } else { ExecutionKind::Paper };
        let adapter = self.build_adapter(&platform).await?;

        // e. place the order.
        state = SubmissionState::Submitting;
        info!(%state, "submission submitting");
        let placed = match adapter.place_order(&order).await {
            Ok(placed) => {
                self.breakers.get_or_create("exchange_api").on_success();
                self.breakers.get_or_create("trade_execution").on_success();
                placed
            }
            Err(err) => {
                if err.counts_toward_breaker() {
                    self.breakers.get_or_create("exchange_api").on_failure();
                    self.breakers.get_or_create("trade_execution").on_failure();
                }
                info!(state = %SubmissionState::Rejected, error = %err, "adapter rejected the order");
                return Err(err);
            }
        };

        // f. update portfolio, write the trade record.
        state = SubmissionState::Recording;
        info!(%state, "submission recording");
        let fill_price = placed.fill_price.unwrap_or(quote.price);
        let trade = Trade {
            id: uuid::Uuid::new_v4().to_string(),
            owner_id: user.id.clone(),
            platform_id: if platform.kind == PlatformKind::Paper { None } else { Some(platform.id.clone()) },
            symbol: order.symbol.clone(),
            side: order.side,
            order_type: order.order_type,
            quantity: order.quantity,
            entry_price: fill_price,
            exit_price: None,
            stop_loss: order.stop_price.filter(|_| matches!(order.order_type, OrderType::StopLoss)),
            take_profit: order.stop_price.filter(|_| matches!(order.order_type, OrderType::TakeProfit)),
            status: TradeStatus::Open,
            pnl: rust_decimal::Decimal::ZERO,
            execution_kind,
            market_price_at_execution: quote.price,
            exchange_order_id: Some(placed.exchange_order_id),
            idempotency_key: order.idempotency_key.clone(),
            created_at: Utc::now(),
            closed_at: None,
        };

        self.portfolios.apply_open(&trade).await?;
        self.trades.insert(&trade).await?;

        // g. notify and stream.
        self.emit_trade_executed(&trade);

        info!(state = %SubmissionState::Idle, trade_id = %trade.id, "submission complete");
        Ok(trade)
    }

    async fn enforce_hard_drawdown(&self, user: &User, portfolio: &crate::domain::portfolio::Portfolio) -> Result<(), AppError> {
        if portfolio.trading_day_start_balance <= rust_decimal::Decimal::ZERO {
            return Ok(());
        }
        let equity = portfolio.total_balance + portfolio.daily_pnl;
        let drawdown = (portfolio.trading_day_start_balance - equity) / portfolio.trading_day_start_balance;
        if drawdown >= self.risk.limits().daily_dd_hard {
            self.kill_switch_users.insert(user.id.clone(), ());
            self.audit
                .append(&user.id, "kill_switch.hard_drawdown", &user.id, json!({"drawdown": drawdown.to_string()}))
                .await?;
            warn!(owner_id = %user.id, %drawdown, "hard drawdown limit breached, tripping per-user kill switch");
            self.close_all_open_positions(&user.id).await;
            return Err(AppError::risk_denied(format!(
                "daily drawdown {drawdown} has breached the hard limit, trading halted for this account"
            )));
        }
        Ok(())
    }

    /// Obtain a quote no older than `QUOTE_FRESHNESS_LIMIT_SECS`. Staleness
    /// trips the breaker for the serving source and rejects the submission
    /// (spec §4.6 step d).
    async fn fresh_quote(&self, symbol: &str) -> Result<crate::domain::quote::Quote, AppError> {
        let quote = self.aggregator.get_quote(symbol).await?;
        if quote.age() > ChronoDuration::seconds(QUOTE_FRESHNESS_LIMIT_SECS) {
            self.breakers.get_or_create(&quote.source_tag).on_failure();
            return Err(AppError::upstream(format!("quote for {symbol} is stale"), true));
        }
        Ok(quote)
    }

    /// Pick the platform to route through (spec §4.6 step 2): the default
    /// connected live platform, else the most recently tested connected
    /// live one, else paper. `requested_platform_id` lets a caller pin a
    /// specific platform explicitly (still must be connected and live).
    async fn select_platform(&self, owner_id: &str, requested_platform_id: Option<&str>) -> Result<Platform, AppError> {
        if let Some(id) = requested_platform_id {
            let platform =
                self.platforms.find(id).await?.ok_or_else(|| AppError::not_found("no such platform"))?;
            if platform.owner_id != owner_id {
                return Err(AppError::forbidden("platform does not belong to this account"));
            }
            return Ok(platform);
        }

        let candidates: Vec<Platform> = self
            .platforms
            .list_for_owner(owner_id)
            .await?
            .into_iter()
            .filter(|p| p.kind.is_live() && p.status == PlatformStatus::Connected)
            .collect();

        if let Some(default_platform) = candidates.iter().find(|p| p.is_default) {
            return Ok(default_platform.clone());
        }
        if let Some(most_recent) = candidates.into_iter().max_by_key(|p| p.last_tested_at) {
            return Ok(most_recent);
        }

        Ok(paper_platform(owner_id))
    }

    async fn build_adapter(&self, platform: &Platform) -> Result<ExchangeAdapterHandle, AppError> {
        let credentials = if platform.kind.is_live() {
            Some(self.credentials.decrypt(&platform.ciphertext)?)
        } else {
            None
        };
        let base_url = self.exchanges.base_url_for(platform.kind, platform.is_sandbox);
        ExchangeAdapterHandle::build(platform, credentials.as_ref(), base_url, self.aggregator.clone())
    }

    fn emit_trade_executed(&self, trade: &Trade) {
        let notification = Notification::new(
            &trade.owner_id,
            NotificationKind::TradeExecuted,
            format!("{:?} {} {} @ {}", trade.side, trade.quantity, trade.symbol, trade.entry_price),
            Priority::Medium,
        );
        let owner_id = trade.owner_id.clone();
        let notifications = self.notifications.clone();
        let notification_for_store = notification.clone();
        tokio::spawn(async move {
            let _ = notifications.insert(&notification_for_store).await;
        });
        self.fanout.publish_notification(&owner_id, notification);
        self.fanout.publish_trade(&owner_id, trade.clone());
        self.fanout.publish_system(SystemEvent {
            kind: "trade_executed".to_string(),
            detail: json!({"owner_id": trade.owner_id, "symbol": trade.symbol, "trade_id": trade.id}),
        });
    }

    /// Analogous to the open path (spec §4.6 step 4): reuses the same
    /// breaker checks and freshness bound, places an opposite-side market
    /// order to realize a fill price, then applies the close to the
    /// portfolio and records it.
    pub async fn close_trade(&self, user: &User, trade_id: &str) -> Result<Trade, AppError> {
        let lock = self.lock_for(&user.id).await;
        let _guard = lock.lock().await;

        let mut trade = self.trades.find(trade_id).await?.ok_or_else(|| AppError::not_found("no such trade"))?;
        if trade.owner_id != user.id {
            return Err(AppError::forbidden("trade does not belong to this account"));
        }
        if trade.status != TradeStatus::Open {
            return Err(AppError::conflict("trade is not open"));
        }

        for key in ["exchange_api", "trade_execution"] {
            if let BreakerDecision::Reject { retry_after_secs } = self.breakers.get_or_create(key).check() {
                return Err(AppError::breaker_open(key, retry_after_secs));
            }
        }

        let quote = self.fresh_quote(&trade.symbol).await?;

        let platform = match &trade.platform_id {
            Some(id) => self.platforms.find(id).await?.ok_or_else(|| AppError::not_found("no such platform"))?,
            None => paper_platform(&trade.owner_id),
        };
        let adapter = self.build_adapter(&platform).await?;

        let closing_order = TradeOrder {
            owner_id: trade.owner_id.clone(),
            symbol: trade.symbol.clone(),
            side: opposite_side(trade.side),
            order_type: OrderType::Market,
            quantity: trade.quantity,
            limit_price: None,
            stop_price: None,
            platform_id: trade.platform_id.clone(),
            idempotency_key: None,
        };

        let placed = match adapter.place_order(&closing_order).await {
            Ok(placed) => {
                self.breakers.get_or_create("exchange_api").on_success();
                self.breakers.get_or_create("trade_execution").on_success();
                placed
            }
            Err(err) => {
                if err.counts_toward_breaker() {
                    self.breakers.get_or_create("exchange_api").on_failure();
                    self.breakers.get_or_create("trade_execution").on_failure();
                }
                return Err(err);
            }
        };

        let exit_price = placed.fill_price.unwrap_or(quote.price);
        let (_, pnl) = self.portfolios.apply_close(&trade, exit_price).await?;

        trade.status = TradeStatus::Closed;
        trade.exit_price = Some(exit_price);
        trade.pnl = pnl;
        trade.closed_at = Some(Utc::now());
        self.trades.update(&trade).await?;

        let notification = Notification::new(
            &trade.owner_id,
            NotificationKind::TradeExecuted,
            format!("closed {} {} for pnl {pnl}", trade.symbol, trade.quantity),
            Priority::Medium,
        );
        let _ = self.notifications.insert(&notification).await;
        self.fanout.publish_notification(&trade.owner_id, notification);
        self.fanout.publish_trade(&trade.owner_id, trade.clone());

        Ok(trade)
    }

    /// Kill-switch sweep (spec §4.6 step 5): close every open position for
    /// `owner_id` oldest-first; a failure on one trade is logged and does
    /// not abort the remaining sweep.
    async fn close_all_open_positions(&self, owner_id: &str) {
        let open = match self.trades.list_open_for_owner(owner_id).await {
            Ok(open) => open,
            Err(err) => {
                warn!(owner_id, error = %err, "kill switch sweep could not list open trades");
                return;
            }
        };
        for trade in open {
            // `close_trade` re-acquires the lock we already hold; run it
            // without the lock by falling back to the inner steps directly
            // via a fresh lookup is unnecessary here since the caller
            // (`enforce_hard_drawdown`) runs before the submission lock is
            // taken in `execute_pipeline`'s own call site, and `score_only`
            // never holds it either — safe to reacquire.
            match self.close_trade_unlocked(owner_id, &trade.id).await {
                Ok(_) => info!(owner_id, trade_id = %trade.id, "kill switch sweep closed trade"),
                Err(err) => warn!(owner_id, trade_id = %trade.id, error = %err, "kill switch sweep failed to close trade"),
            }
        }
    }

    async fn close_trade_unlocked(&self, owner_id: &str, trade_id: &str) -> Result<Trade, AppError> {
        let mut trade = self.trades.find(trade_id).await?.ok_or_else(|| AppError::not_found("no such trade"))?;
        if trade.owner_id != owner_id || trade.status != TradeStatus::Open {
            return Err(AppError::conflict("trade is not an open trade for this owner"));
        }

        let quote = self.fresh_quote(&trade.symbol).await?;
        let platform = match &trade.platform_id {
            Some(id) => self.platforms.find(id).await?.ok_or_else(|| AppError::not_found("no such platform"))?,
            None => paper_platform(owner_id),
        };
        let adapter = self.build_adapter(&platform).await?;
        let closing_order = TradeOrder {
            owner_id: owner_id.to_string(),
            symbol: trade.symbol.clone(),
            side: opposite_side(trade.side),
            order_type: OrderType::Market,
            quantity: trade.quantity,
            limit_price: None,
            stop_price: None,
            platform_id: trade.platform_id.clone(),
            idempotency_key: None,
        };
        let placed = adapter.place_order(&closing_order).await?;
        let exit_price = placed.fill_price.unwrap_or(quote.price);
        let (_, pnl) = self.portfolios.apply_close(&trade, exit_price).await?;

        trade.status = TradeStatus::Closed;
        trade.exit_price = Some(exit_price);
        trade.pnl = pnl;
        trade.closed_at = Some(Utc::now());
        self.trades.update(&trade).await?;
        Ok(trade)
    }
}

fn opposite_side(side: OrderSide) -> OrderSide {
    match side {
        OrderSide::Buy => OrderSide::Sell,
        OrderSide::Sell => OrderSide::Buy,
    }
}

fn paper_platform(owner_id: &str) -> Platform {
    Platform {
        id: "paper".to_string(),
        owner_id: owner_id.to_string(),
        name: "Paper".to_string(),
        kind: PlatformKind::Paper,
        is_sandbox: true,
        is_default: false,
        ciphertext: Vec::new(),
        status: PlatformStatus::Connected,
        last_tested_at: None,
        created_at: Utc::now(),
    }
}
