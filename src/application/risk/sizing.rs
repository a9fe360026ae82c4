//! Position sizing advisory (spec §4.5 point 4), generalized from the
//! teacher's `sizing_engine.rs` `min(...)`-of-caps shape down to this spec's
//! exact two-term formula — no Kelly cap, volatility targeting, or spread
//! slippage adjustment, since those are Non-goals here (backtesting-era
//! refinements the teacher accreted for a single-tenant bot).

use crate::domain::risk::RiskLimits;
use rust_decimal::Decimal;

/// `min(equity * risk_fraction / stop_distance, per_trade_max * equity / reference_price)`.
/// Returns `Decimal::ZERO` if `stop_distance` or `reference_price` is non-positive —
/// the caller has no stop or price to size against.
pub fn advisory_max_quantity(
    limits: &RiskLimits,
    equity: Decimal,
    stop_distance: Decimal,
    reference_price: Decimal,
) -> Decimal {
    if stop_distance <= Decimal::ZERO || reference_price <= Decimal::ZERO || equity <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let risk_sized = (equity * limits.risk_fraction) / stop_distance;
    let cap_sized = (limits.per_trade_max * equity) / reference_price;
    risk_sized.min(cap_sized)
}
