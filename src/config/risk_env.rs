//! Env-overridable `RiskLimits` defaults (spec §4.5). Every value has the
//! spec's literal default and can be tightened or loosened per deployment.

use crate::domain::risk::RiskLimits;
use anyhow::{Context, Result};
use rust_decimal::Decimal;

#[derive(Debug, Clone)]
pub struct RiskEnvConfig {
    pub limits: RiskLimits,
}

fn parse_decimal_env(key: &str, default: &str) -> Result<Decimal> {
    std::env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse::<Decimal>()
        .with_context(|| format!("{key} must be a decimal number"))
}

impl RiskEnvConfig {
    pub fn from_env() -> Result<Self> {
        let limits = RiskLimits {
            per_trade_max: parse_decimal_env("RISK_PER_TRADE_MAX", "0.005")?,
            leverage_max: parse_decimal_env("RISK_LEVERAGE_MAX", "3")?,
            daily_dd_soft: parse_decimal_env("RISK_DAILY_DD_SOFT", "0.03")?,
            daily_dd_hard: parse_decimal_env("RISK_DAILY_DD_HARD", "0.05")?,
            risk_fraction: parse_decimal_env("RISK_FRACTION", "0.01")?,
        };
        Ok(Self { limits })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_spec() {
        let _guard = crate::config::test_support::env_lock().lock().unwrap();
        unsafe {
            std::env::remove_var("RISK_PER_TRADE_MAX");
        }
        let config = RiskEnvConfig::from_env().unwrap();
        assert_eq!(config.limits.per_trade_max, rust_decimal_macros::dec!(0.005));
    }
}
