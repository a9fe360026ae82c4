use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionSide {
    Long,
    Short,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub quantity: Decimal,
    pub average_price: Decimal,
    pub side: PositionSide,
}

impl Position {
    pub fn notional(&self) -> Decimal {
        self.quantity * self.average_price
    }

    pub fn unrealized_pnl(&self, current_price: Decimal) -> Decimal {
        let delta = current_price - self.average_price;
        match self.side {
            PositionSide::Long => delta * self.quantity,
            PositionSide::Short => -delta * self.quantity,
        }
    }
}

/// Per-user authoritative balance and position state (spec §3).
///
/// Invariant 1: `total_balance == available_balance + invested_balance`
/// within one representable least-significant unit of `Decimal`.
/// Invariant 2: an open trade's notional is counted in `invested_balance`
/// and excluded from `available_balance`.
///
/// Mutated only through `application::accounting::PortfolioService` — this
/// type itself is a plain value with no interior mutability, matching the
/// Design Notes' "model the Portfolio as a value" recommendation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Portfolio {
    pub owner_id: String,
    pub total_balance: Decimal,
    pub available_balance: Decimal,
    pub invested_balance: Decimal,
    pub daily_pnl: Decimal,
    pub total_pnl: Decimal,
    pub positions: HashMap<String, Position>,
    /// Wall-clock start of the current trading day, for daily P&L / drawdown
    /// resets (spec §4.5.3).
    pub trading_day_start_balance: Decimal,
}

impl Portfolio {
    pub fn new(owner_id: impl Into<String>, seed_balance: Decimal) -> Self {
        Self {
            owner_id: owner_id.into(),
            total_balance: seed_balance,
            available_balance: seed_balance,
            invested_balance: Decimal::ZERO,
            daily_pnl: Decimal::ZERO,
            total_pnl: Decimal::ZERO,
            positions: HashMap::new(),
            trading_day_start_balance: seed_balance,
        }
    }

    /// Check invariant 1 holds within one least-significant unit at the
    /// ledger's working scale (8 decimal places, matching crypto quantities).
    pub fn balances_reconcile(&self) -> bool {
        let epsilon = Decimal::new(1, 8);
        (self.total_balance - (self.available_balance + self.invested_balance)).abs() <= epsilon
    }

    pub fn equity(&self, current_prices: &HashMap<String, Decimal>) -> Decimal {
        let unrealized: Decimal = self
            .positions
            .iter()
            .map(|(symbol, pos)| {
                current_prices
                    .get(symbol)
                    .map(|&price| pos.unrealized_pnl(price))
                    .unwrap_or(Decimal::ZERO)
            })
            .sum();
        self.total_balance + unrealized
    }

    pub fn daily_drawdown_pct(&self, current_prices: &HashMap<String, Decimal>) -> Decimal {
        if self.trading_day_start_balance == Decimal::ZERO {
            return Decimal::ZERO;
        }
        let equity = self.equity(current_prices);
        let drawdown = self.trading_day_start_balance - equity;
        (drawdown / self.trading_day_start_balance).max(Decimal::ZERO)
    }
}
