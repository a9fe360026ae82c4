use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Risk limits, configurable per spec §4.5 defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskLimits {
    /// Max single-trade notional as a fraction of total balance.
    pub per_trade_max: Decimal,
    /// Max aggregate open exposure as a multiple of equity.
    pub leverage_max: Decimal,
    /// Drawdown fraction above which no new trades are accepted.
    pub daily_dd_soft: Decimal,
    /// Drawdown fraction above which the kill-switch fires.
    pub daily_dd_hard: Decimal,
    /// Fraction of equity risked per trade for sizing advisory.
    pub risk_fraction: Decimal,
}

impl Default for RiskLimits {
    fn default() -> Self {
        Self {
            per_trade_max: Decimal::new(5, 3),      // 0.5%
            leverage_max: Decimal::new(3, 0),        // 3x
            daily_dd_soft: Decimal::new(3, 2),       // 3%
            daily_dd_hard: Decimal::new(5, 2),       // 5%
            risk_fraction: Decimal::new(1, 2),       // 1%
        }
    }
}

/// Outcome of risk evaluation (spec §4.5). The engine never mutates state;
/// the Trade Router applies the verdict.
#[derive(Debug, Clone, PartialEq)]
pub enum RiskVerdict {
    Allow,
    Reduce { new_quantity: Decimal, advisory_max_quantity: Decimal },
    Deny { reason: String },
}

impl RiskVerdict {
    pub fn is_allowed(&self) -> bool {
        !matches!(self, RiskVerdict::Deny { .. })
    }
}
