use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertCondition {
    PriceAbove,
    PriceBelow,
    RsiAbove,
    RsiBelow,
    VolumeSpike,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertState {
    Armed,
    Triggered,
    Dismissed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmartAlert {
    pub id: String,
    pub owner_id: String,
    pub symbol: String,
    pub condition: AlertCondition,
    pub threshold: Decimal,
    pub fingerprint: String,
    pub state: AlertState,
}

/// Stable hash of `{owner_id, symbol, condition, bucketised threshold}`
/// (spec §3). Thresholds are bucketised to 4 significant digits so that
/// near-identical thresholds (e.g. two clients racing to arm "price above
/// 60000.001" vs "60000.002") fingerprint identically, which is what makes
/// invariant 6 ("two armed alerts never share a fingerprint for the same
/// owner") enforceable rather than a coincidence of exact-equality luck.
pub fn alert_fingerprint(
    owner_id: &str,
    symbol: &str,
    condition: AlertCondition,
    threshold: Decimal,
) -> String {
    let bucketed = bucketise(threshold);
    let mut hasher = Sha256::new();
    hasher.update(owner_id.as_bytes());
    hasher.update(b"|");
    hasher.update(symbol.as_bytes());
    hasher.update(b"|");
    hasher.update(format!("{condition:?}").as_bytes());
    hasher.update(b"|");
    hasher.update(bucketed.as_bytes());
    hex::encode(hasher.finalize())
}

/// Round to 4 significant digits in a sign- and magnitude-stable way.
fn bucketise(value: Decimal) -> String {
    if value.is_zero() {
        return "0".to_string();
    }
    let magnitude = value.abs();
    let mut scale = 0i32;
    let mut scaled = magnitude;
    while scaled >= Decimal::from(10000) {
        scaled /= Decimal::from(10);
        scale += 1;
    }
    while scaled < Decimal::from(1000) {
        scaled *= Decimal::from(10);
        scale -= 1;
    }
    let rounded = scaled.round();
    format!("{}:{}:{}", value.is_sign_negative(), rounded, scale)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn identical_inputs_fingerprint_identically() {
        let a = alert_fingerprint("u1", "BTCUSDT", AlertCondition::PriceAbove, dec!(60000));
        let b = alert_fingerprint("u1", "BTCUSDT", AlertCondition::PriceAbove, dec!(60000));
        assert_eq!(a, b);
    }

    #[test]
    fn near_identical_thresholds_bucket_together() {
        let a = alert_fingerprint("u1", "BTCUSDT", AlertCondition::PriceAbove, dec!(60000.001));
        let b = alert_fingerprint("u1", "BTCUSDT", AlertCondition::PriceAbove, dec!(60000.002));
        assert_eq!(a, b);
    }

    #[test]
    fn different_owners_fingerprint_differently() {
        let a = alert_fingerprint("u1", "BTCUSDT", AlertCondition::PriceAbove, dec!(60000));
        let b = alert_fingerprint("u2", "BTCUSDT", AlertCondition::PriceAbove, dec!(60000));
        assert_ne!(a, b);
    }

    #[test]
    fn different_conditions_fingerprint_differently() {
        let a = alert_fingerprint("u1", "BTCUSDT", AlertCondition::PriceAbove, dec!(60000));
        let b = alert_fingerprint("u1", "BTCUSDT", AlertCondition::PriceBelow, dec!(60000));
        assert_ne!(a, b);
    }
}
