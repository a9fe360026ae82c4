//! `RiskValidator` trait and the fail-fast fixed set of validators (spec
//! §4.5): `PerTradeExposure`, `AggregateLeverage`, `DailyDrawdown`.
//! Grounded on the teacher's `RiskValidator`/`ValidationContext`/
//! `ValidationResult` triple in `application/risk_management/pipeline/
//! validation_pipeline.rs`, generalized to this spec's exact three checks
//! and `RiskVerdict` outcome type rather than the teacher's open-ended
//! validator roster (trailing stops, liquidation, session management, etc,
//! all out of scope per this spec's Non-goals).

use crate::domain::order::TradeOrder;
use crate::domain::portfolio::Portfolio;
use crate::domain::quote::Quote;
use crate::domain::risk::RiskLimits;
use crate::domain::trade::Trade;
use rust_decimal::Decimal;

/// Everything a validator needs to judge one proposed order. Built fresh per
/// call, never suspended on — no `.await` is reachable from `evaluate`.
pub struct ValidationContext<'a> {
    pub order: &'a TradeOrder,
    pub portfolio: &'a Portfolio,
    pub quote: &'a Quote,
    pub open_trades: &'a [Trade],
    pub limits: &'a RiskLimits,
}

pub trait RiskValidator: Send + Sync {
    fn name(&self) -> &'static str;
    /// Lower runs first. Ties broken by declaration order.
    fn priority(&self) -> u8;
    /// `Some(reason)` rejects; `None` passes.
    fn evaluate(&self, ctx: &ValidationContext<'_>) -> Option<String>;
}

pub struct PerTradeExposure;

impl RiskValidator for PerTradeExposure {
    fn name(&self) -> &'static str {
        "per_trade_exposure"
    }

    fn priority(&self) -> u8 {
        10
    }

    fn evaluate(&self, ctx: &ValidationContext<'_>) -> Option<String> {
        if ctx.portfolio.total_balance <= Decimal::ZERO {
            return Some("portfolio has no balance to size against".to_string());
        }
        let notional = ctx.order.quantity * ctx.quote.price;
        let exposure = notional / ctx.portfolio.total_balance;
        if exposure > ctx.limits.per_trade_max {
            return Some(format!(
                "per_trade_exposure {exposure} exceeds limit {}",
                ctx.limits.per_trade_max
            ));
        }
        None
    }
}

pub struct AggregateLeverage;

impl RiskValidator for AggregateLeverage {
    fn name(&self) -> &'static str {
        "aggregate_leverage"
    }

    fn priority(&self) -> u8 {
        20
    }

    fn evaluate(&self, ctx: &ValidationContext<'_>) -> Option<String> {
        if ctx.portfolio.total_balance <= Decimal::ZERO {
            return Some("portfolio has no balance to size against".to_string());
        }
        let open_notional: Decimal = ctx.open_trades.iter().map(Trade::notional).sum();
        let proposed_notional = ctx.order.quantity * ctx.quote.price;
        let aggregate = open_notional + proposed_notional;
        let max_allowed = ctx.limits.leverage_max * ctx.portfolio.total_balance;
        if aggregate > max_allowed {
            return Some(format!("aggregate exposure {aggregate} would exceed leverage cap {max_allowed}"));
        }
        None
    }
}

pub struct DailyDrawdown;

impl RiskValidator for DailyDrawdown {
    fn name(&self) -> &'static str {
        "daily_drawdown"
    }

    fn priority(&self) -> u8 {
        30
    }

    fn evaluate(&self, ctx: &ValidationContext<'_>) -> Option<String> {
        if ctx.portfolio.trading_day_start_balance <= Decimal::ZERO {
            return None;
        }
        let equity = ctx.portfolio.total_balance + ctx.portfolio.daily_pnl;
        let drawdown = (ctx.portfolio.trading_day_start_balance - equity)
            / ctx.portfolio.trading_day_start_balance;
        if drawdown >= ctx.limits.daily_dd_soft {
            return Some(format!("daily drawdown {drawdown} has reached the soft limit {}", ctx.limits.daily_dd_soft));
        }
        None
    }
}

/// Runs the fixed validator set, sorted by priority, fail-fast. Not a
/// user-extensible registry — the spec names exactly three checks.
pub fn default_validators() -> Vec<Box<dyn RiskValidator>> {
    let mut validators: Vec<Box<dyn RiskValidator>> =
        vec![Box::new(PerTradeExposure), Box::new(AggregateLeverage), Box::new(DailyDrawdown)];
    validators.sort_by_key(|v| v.priority());
    validators
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::{OrderSide, OrderType};
    use crate::domain::quote::AssetClass;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn quote(price: Decimal) -> Quote {
        Quote {
            symbol: "BTCUSDT".into(),
            price,
            change_24h_pct: Decimal::ZERO,
            volume_24h: Decimal::ZERO,
            high_24h: price,
            low_24h: price,
            asset_class: AssetClass::Crypto,
            source_tag: "test".into(),
            fetched_at: Utc::now(),
            fetched_monotonic: None,
        }
    }

    fn order(quantity: Decimal) -> TradeOrder {
        TradeOrder {
            owner_id: "u1".into(),
            symbol: "BTCUSDT".into(),
            side: OrderSide::Buy,
            order_type: OrderType::Market,
            quantity,
            limit_price: None,
            stop_price: None,
            platform_id: None,
            idempotency_key: None,
        }
    }

    #[test]
    fn per_trade_exposure_rejects_oversized_order() {
        let portfolio = Portfolio::new("u1", dec!(10000));
        let limits = RiskLimits::default();
        let ctx = ValidationContext {
            order: &order(dec!(1)),
            portfolio: &portfolio,
            quote: &quote(dec!(60000)),
            open_trades: &[],
            limits: &limits,
        };
        assert!(PerTradeExposure.evaluate(&ctx).is_some());
    }

    #[test]
    fn per_trade_exposure_allows_small_order() {
        let portfolio = Portfolio::new("u1", dec!(10000));
        let limits = RiskLimits::default();
        let ctx = ValidationContext {
            order: &order(dec!(0.001)),
            portfolio: &portfolio,
            quote: &quote(dec!(100)),
            open_trades: &[],
            limits: &limits,
        };
        assert!(PerTradeExposure.evaluate(&ctx).is_none());
    }

    #[test]
    fn daily_drawdown_soft_limit_rejects() {
        let mut portfolio = Portfolio::new("u1", dec!(10000));
        portfolio.daily_pnl = dec!(-400); // 4% drawdown, over the 3% soft limit
        let limits = RiskLimits::default();
        let ctx = ValidationContext {
            order: &order(dec!(0.001)),
            portfolio: &portfolio,
            quote: &quote(dec!(100)),
            open_trades: &[],
            limits: &limits,
        };
        assert!(DailyDrawdown.evaluate(&ctx).is_some());
    }

    #[test]
    fn default_validators_are_priority_sorted() {
        let validators = default_validators();
        assert_eq!(validators[0].name(), "per_trade_exposure");
        assert_eq!(validators[1].name(), "aggregate_leverage");
        assert_eq!(validators[2].name(), "daily_drawdown");
    }
}
