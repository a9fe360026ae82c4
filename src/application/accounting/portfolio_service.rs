use crate::domain::errors::AppError;
use crate::domain::ports::{AuditRepository, PortfolioRepository};
use crate::domain::portfolio::{Portfolio, Position, PositionSide};
use crate::domain::trade::Trade;
use dashmap::DashMap;
use rust_decimal::Decimal;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::RwLock;

struct CachedPortfolio {
    portfolio: Portfolio,
    seq: u64,
}

/// Owns the authoritative in-memory Portfolio state for every user the
/// process has touched, backed by `PortfolioRepository` for durability.
///
/// Single-writer-per-user is enforced by holding each user's `RwLock` write
/// guard across the repository upsert (spec §4.7/§5: "single writer per
/// user; many readers", "mutations... observed in submission order"),
/// generalizing the teacher's `PortfolioStateManager` (a single global
/// `Arc<RwLock<VersionedPortfolio>>`) to one entry per owner via `DashMap`.
pub struct PortfolioService {
    repo: Arc<dyn PortfolioRepository>,
    audit: Arc<dyn AuditRepository>,
    cache: DashMap<String, Arc<RwLock<CachedPortfolio>>>,
}

impl PortfolioService {
    pub fn new(repo: Arc<dyn PortfolioRepository>, audit: Arc<dyn AuditRepository>) -> Self {
        Self { repo, audit, cache: DashMap::new() }
    }

    async fn entry_for(&self, owner_id: &str) -> Result<Arc<RwLock<CachedPortfolio>>, AppError> {
        if let Some(entry) = self.cache.get(owner_id) {
            return Ok(entry.clone());
        }
        // Not cached: load from storage (or seed) and insert. Two concurrent
        // callers racing here both load/seed and one insert wins; since both
        // observe the same durable state this does not violate the
        // single-writer invariant, only the cache-population race is benign.
        let portfolio = match self.repo.get(owner_id).await? {
            Some(portfolio) => portfolio,
            None => return Err(AppError::not_found(format!("no portfolio for {owner_id}"))),
        };
        let entry = Arc::new(RwLock::new(CachedPortfolio { portfolio, seq: 0 }));
        self.cache.entry(owner_id.to_string()).or_insert_with(|| entry.clone());
        Ok(self.cache.get(owner_id).unwrap().clone())
    }

    /// Create and persist a fresh portfolio for a newly registered user.
    /// Idempotent: if one already exists, returns it unchanged.
    pub async fn seed(&self, owner_id: &str, seed_balance: Decimal) -> Result<Portfolio, AppError> {
        if let Some(existing) = self.repo.get(owner_id).await? {
            return Ok(existing);
        }
        let portfolio = Portfolio::new(owner_id, seed_balance);
        self.repo.upsert(&portfolio).await?;
        self.audit
            .append(owner_id, "portfolio.seeded", owner_id, json!({"seed_balance_usd": seed_balance.to_string()}))
            .await?;
        self.cache.insert(owner_id.to_string(), Arc::new(RwLock::new(CachedPortfolio { portfolio: portfolio.clone(), seq: 0 })));
        Ok(portfolio)
    }

    /// Consistent point-in-time read. Never blocks a concurrent writer for
    /// longer than a clone.
    pub async fn snapshot(&self, owner_id: &str) -> Result<Portfolio, AppError> {
        let entry = self.entry_for(owner_id).await?;
        let guard = entry.read().await;
        Ok(guard.portfolio.clone())
    }

    /// Apply a newly opened trade: move its notional from available to
    /// invested balance and fold it into the aggregate per-symbol position.
    pub async fn apply_open(&self, trade: &Trade) -> Result<Portfolio, AppError> {
        let entry = self.entry_for(&trade.owner_id).await?;
        let mut guard = entry.write().await;

        let notional = trade.notional();
        if guard.portfolio.available_balance < notional {
            return Err(AppError::internal(format!(
                "portfolio {} available balance {} insufficient for notional {notional}, invariant should have been enforced by risk engine",
                trade.owner_id, guard.portfolio.available_balance
            )));
        }

        guard.portfolio.available_balance -= notional;
        guard.portfolio.invested_balance += notional;
        fold_position(&mut guard.portfolio, trade);

        self.persist(&mut guard, "trade.opened", &trade.id, json!({"trade_id": trade.id, "symbol": trade.symbol, "notional": notional.to_string()})).await?;
        Ok(guard.portfolio.clone())
    }

    /// Apply a trade close: release its notional, realize P&L, and unwind
    /// the contribution it made to the aggregate position at open.
    ///
    /// Assumes no intervening trade on the same symbol flipped net side
    /// between this trade's open and close (the Router serializes a user's
    /// submissions, so the only way to violate this is manual position
    /// surgery outside the Router, which this service does not expose).
    pub async fn apply_close(&self, trade: &Trade, exit_price: Decimal) -> Result<(Portfolio, Decimal), AppError> {
        let entry = self.entry_for(&trade.owner_id).await?;
        let mut guard = entry.write().await;

        let notional = trade.notional();
        let pnl = trade.realized_pnl(exit_price);

        guard.portfolio.invested_balance -= notional;
        guard.portfolio.available_balance += notional + pnl;
        guard.portfolio.total_balance += pnl;
        guard.portfolio.daily_pnl += pnl;
        guard.portfolio.total_pnl += pnl;
        unfold_position(&mut guard.portfolio, trade);

        self.persist(
            &mut guard,
            "trade.closed",
            &trade.id,
            json!({"trade_id": trade.id, "symbol": trade.symbol, "pnl": pnl.to_string(), "exit_price": exit_price.to_string()}),
        )
        .await?;
        Ok((guard.portfolio.clone(), pnl))
    }

    /// Roll `trading_day_start_balance` forward and zero `daily_pnl`. Called
    /// once per user per trading day by the bootstrap scheduler.
    pub async fn roll_trading_day(&self, owner_id: &str) -> Result<Portfolio, AppError> {
        let entry = self.entry_for(owner_id).await?;
        let mut guard = entry.write().await;
        guard.portfolio.trading_day_start_balance = guard.portfolio.total_balance;
        guard.portfolio.daily_pnl = Decimal::ZERO;
        self.persist(&mut guard, "portfolio.day_rolled", owner_id, json!({})).await?;
        Ok(guard.portfolio.clone())
    }

    /// Rolls every portfolio on record forward to a new trading day. Run by
    /// the bootstrap day-boundary task; one owner's failure does not stop
    /// the rest, mirroring the resilience of `TradeRouter::close_all_open_positions`.
    pub async fn roll_all_trading_days(&self) {
        let owner_ids = match self.repo.list_owner_ids().await {
            Ok(ids) => ids,
            Err(err) => {
                tracing::error!(%err, "failed to list portfolio owners for trading day roll");
                return;
            }
        };
        for owner_id in owner_ids {
            if let Err(err) = self.roll_trading_day(&owner_id).await {
                tracing::error!(owner_id, %err, "failed to roll trading day for owner");
            }
        }
    }

    async fn persist(&self, guard: &mut CachedPortfolio, action: &str, resource: &str, mut detail: serde_json::Value) -> Result<(), AppError> {
        debug_assert!(
            guard.portfolio.balances_reconcile(),
            "portfolio invariant 1 violated for {} after {action}",
            guard.portfolio.owner_id
        );
        guard.seq += 1;
        if let Some(obj) = detail.as_object_mut() {
            obj.insert("seq".to_string(), json!(guard.seq));
        }
        self.repo.upsert(&guard.portfolio).await?;
        self.audit.append(&guard.portfolio.owner_id, action, resource, detail).await?;
        Ok(())
    }
}

fn fold_position(portfolio: &mut Portfolio, trade: &Trade) {
    use crate::domain::order::OrderSide;
    let side = match trade.side {
        OrderSide::Buy => PositionSide::Long,
        OrderSide::Sell => PositionSide::Short,
    };

    match portfolio.positions.get_mut(&trade.symbol) {
        Some(existing) if existing.side == side => {
            let total_qty = existing.quantity + trade.quantity;
            existing.average_price = (existing.average_price * existing.quantity + trade.entry_price * trade.quantity) / total_qty;
            existing.quantity = total_qty;
        }
        Some(existing) => {
            // Opposite side: netting reduces, flips, or closes the position.
            if trade.quantity < existing.quantity {
                existing.quantity -= trade.quantity;
            } else if trade.quantity > existing.quantity {
                let remainder = trade.quantity - existing.quantity;
                portfolio.positions.insert(trade.symbol.clone(), Position { quantity: remainder, average_price: trade.entry_price, side });
            } else {
                portfolio.positions.remove(&trade.symbol);
            }
        }
        None => {
            portfolio.positions.insert(trade.symbol.clone(), Position { quantity: trade.quantity, average_price: trade.entry_price, side });
        }
    }
}

fn unfold_position(portfolio: &mut Portfolio, trade: &Trade) {
    if let Some(existing) = portfolio.positions.get_mut(&trade.symbol) {
        if existing.quantity <= trade.quantity {
            portfolio.positions.remove(&trade.symbol);
        } else {
            existing.quantity -= trade.quantity;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::{OrderSide, OrderType};
    use crate::domain::trade::{ExecutionKind, TradeStatus};
    use async_trait::async_trait;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use tokio::sync::Mutex as AsyncMutex;

    struct FakePortfolioRepo {
        rows: AsyncMutex<std::collections::HashMap<String, Portfolio>>,
    }

    impl FakePortfolioRepo {
        fn new() -> Self {
            Self { rows: AsyncMutex::new(std::collections::HashMap::new()) }
        }
    }

    #[async_trait]
    impl PortfolioRepository for FakePortfolioRepo {
        async fn get(&self, owner_id: &str) -> Result<Option<Portfolio>, AppError> {
            Ok(self.rows.lock().await.get(owner_id).cloned())
        }

        async fn upsert(&self, portfolio: &Portfolio) -> Result<(), AppError> {
            self.rows.lock().await.insert(portfolio.owner_id.clone(), portfolio.clone());
            Ok(())
        }

        async fn list_owner_ids(&self) -> Result<Vec<String>, AppError> {
            Ok(self.rows.lock().await.keys().cloned().collect())
        }
    }

    struct FakeAuditRepo;

    #[async_trait]
    impl AuditRepository for FakeAuditRepo {
        async fn append(&self, _actor: &str, _action: &str, _resource: &str, _detail: serde_json::Value) -> Result<(), AppError> {
            Ok(())
        }
    }

    fn service() -> PortfolioService {
        PortfolioService::new(Arc::new(FakePortfolioRepo::new()), Arc::new(FakeAuditRepo))
    }

    fn trade(owner: &str, side: OrderSide, qty: Decimal, entry: Decimal) -> Trade {
        Trade {
            id: uuid::Uuid::new_v4().to_string(),
            owner_id: owner.to_string(),
            platform_id: None,
            symbol: "BTCUSDT".into(),
            side,
            order_type: OrderType::Market,
            quantity: qty,
            entry_price: entry,
            exit_price: None,
            stop_loss: None,
            take_profit: None,
            status: TradeStatus::Open,
            pnl: Decimal::ZERO,
            execution_kind: ExecutionKind::Paper,
            market_price_at_execution: entry,
            exchange_order_id: None,
            idempotency_key: None,
            created_at: Utc::now(),
            closed_at: None,
        }
    }

    #[tokio::test]
    async fn seed_is_idempotent() {
        let svc = service();
        let p1 = svc.seed("u1", dec!(10000)).await.unwrap();
        let p2 = svc.seed("u1", dec!(99999)).await.unwrap();
        assert_eq!(p1.total_balance, p2.total_balance);
    }

    #[tokio::test]
    async fn open_moves_notional_and_reconciles() {
        let svc = service();
        svc.seed("u1", dec!(10000)).await.unwrap();
        let t = trade("u1", OrderSide::Buy, dec!(0.1), dec!(10000));

        let portfolio = svc.apply_open(&t).await.unwrap();
        assert_eq!(portfolio.available_balance, dec!(9000));
        assert_eq!(portfolio.invested_balance, dec!(1000));
        assert!(portfolio.balances_reconcile());
        assert_eq!(portfolio.positions.get("BTCUSDT").unwrap().quantity, dec!(0.1));
    }

    #[tokio::test]
    async fn close_realizes_pnl_and_clears_position() {
        let svc = service();
        svc.seed("u1", dec!(10000)).await.unwrap();
        let t = trade("u1", OrderSide::Buy, dec!(0.1), dec!(10000));
        svc.apply_open(&t).await.unwrap();

        let (portfolio, pnl) = svc.apply_close(&t, dec!(11000)).await.unwrap();
        assert_eq!(pnl, dec!(100));
        assert_eq!(portfolio.total_balance, dec!(10100));
        assert_eq!(portfolio.invested_balance, dec!(0));
        assert!(portfolio.positions.get("BTCUSDT").is_none());
        assert!(portfolio.balances_reconcile());
    }

    #[tokio::test]
    async fn rejects_open_exceeding_available_balance() {
        let svc = service();
        svc.seed("u1", dec!(1000)).await.unwrap();
        let t = trade("u1", OrderSide::Buy, dec!(1), dec!(10000));
        assert!(svc.apply_open(&t).await.is_err());
    }

    #[tokio::test]
    async fn roll_trading_day_resets_daily_pnl_and_start_balance() {
        let svc = service();
        svc.seed("u1", dec!(10000)).await.unwrap();
        let t = trade("u1", OrderSide::Buy, dec!(0.1), dec!(10000));
        svc.apply_open(&t).await.unwrap();
        svc.apply_close(&t, dec!(9000)).await.unwrap();

        let before = svc.snapshot("u1").await.unwrap();
        assert_ne!(before.daily_pnl, Decimal::ZERO);

        let rolled = svc.roll_trading_day("u1").await.unwrap();
        assert_eq!(rolled.daily_pnl, Decimal::ZERO);
        assert_eq!(rolled.trading_day_start_balance, rolled.total_balance);
    }

    #[tokio::test]
    async fn roll_all_trading_days_rolls_every_owner_on_record() {
        let svc = service();
        svc.seed("u1", dec!(10000)).await.unwrap();
        svc.seed("u2", dec!(5000)).await.unwrap();
        let t = trade("u1", OrderSide::Buy, dec!(0.1), dec!(10000));
        svc.apply_open(&t).await.unwrap();
        svc.apply_close(&t, dec!(9000)).await.unwrap();

        svc.roll_all_trading_days().await;

        assert_eq!(svc.snapshot("u1").await.unwrap().daily_pnl, Decimal::ZERO);
        assert_eq!(svc.snapshot("u2").await.unwrap().daily_pnl, Decimal::ZERO);
    }
}
