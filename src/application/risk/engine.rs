//! `RiskEngine` — pure evaluator per spec §4.5. Runs the fixed validator
//! pipeline fail-fast, then attaches a sizing advisory; never mutates
//! state and never suspends (no `.await` reachable from `evaluate`), so the
//! Trade Router can call it from inside a held lock.

use crate::application::risk::sizing::advisory_max_quantity;
use crate::application::risk::validators::{ValidationContext, default_validators};
use crate::domain::order::TradeOrder;
use crate::domain::portfolio::Portfolio;
use crate::domain::quote::Quote;
use crate::domain::risk::{RiskLimits, RiskVerdict};
use crate::domain::trade::Trade;
use rust_decimal::Decimal;

pub struct RiskEngine {
    limits: RiskLimits,
}

impl RiskEngine {
    pub fn new(limits: RiskLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &RiskLimits {
        &self.limits
    }

    /// Evaluate a proposed order against the current portfolio and quote.
    /// `open_trades` must be the caller's already-open trades for this
    /// owner (the Trade Router holds the per-user lock while calling this).
    pub fn evaluate(
        &self,
        order: &TradeOrder,
        portfolio: &Portfolio,
        quote: &Quote,
        open_trades: &[Trade],
    ) -> RiskVerdict {
        let ctx = ValidationContext { order, portfolio, quote, open_trades, limits: &self.limits };

        for validator in default_validators() {
            if let Some(reason) = validator.evaluate(&ctx) {
                return RiskVerdict::Deny { reason };
            }
        }

        let stop_distance = order.stop_price.map(|stop| (quote.price - stop).abs());
        let equity = portfolio.total_balance + portfolio.daily_pnl;
        let advisory = match stop_distance {
            Some(distance) if distance > Decimal::ZERO => {
                advisory_max_quantity(&self.limits, equity, distance, quote.price)
            }
            _ => (self.limits.per_trade_max * equity) / quote.price,
        };

        if advisory > Decimal::ZERO && order.quantity > advisory {
            RiskVerdict::Reduce { new_quantity: advisory, advisory_max_quantity: advisory }
        } else {
            RiskVerdict::Allow
        }
    }
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
    fn allows_a_conservatively_sized_order() {
        let engine = RiskEngine::new(RiskLimits::default());
        let portfolio = Portfolio::new("u1", dec!(10000));
        let verdict = engine.evaluate(&order(dec!(0.0005)), &portfolio, &quote(dec!(60000)), &[]);
        assert_eq!(verdict, RiskVerdict::Allow);
    }

    #[test]
    fn denies_when_per_trade_exposure_exceeded() {
        let engine = RiskEngine::new(RiskLimits::default());
        let portfolio = Portfolio::new("u1", dec!(10000));
        let verdict = engine.evaluate(&order(dec!(1)), &portfolio, &quote(dec!(60000)), &[]);
        assert!(matches!(verdict, RiskVerdict::Deny { .. }));
    }

    #[test]
    fn reduces_when_order_exceeds_the_sizing_advisory() {
        let engine = RiskEngine::new(RiskLimits::default());
        let portfolio = Portfolio::new("u1", dec!(10000));
        let mut proposed = order(dec!(0.49));
        // Wide stop distance pulls the risk-fraction term below the
        // per-trade-cap term, so the advisory (their min) undercuts an
        // order that still clears the per-trade-exposure validator outright.
        proposed.stop_price = Some(dec!(310));
        let verdict = engine.evaluate(&proposed, &portfolio, &quote(dec!(100)), &[]);
        assert!(matches!(verdict, RiskVerdict::Reduce { .. }));
    }
}
