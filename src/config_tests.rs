//! End-to-end tests for `Config::from_env()` assembling all five
//! sub-configs together. Per-field validation lives next to each
//! `*_env.rs`; these tests cover cross-cutting assembly (required vs
//! defaulted vars, `AI_PROVIDER_KEY` absence, `SEED_BALANCE_USD`).

use crate::config::Config;
use crate::config::test_support::env_lock;
use std::env;

const REQUIRED_VARS: &[(&str, &str)] = &[("VAULT_KEY", "dGVzdC12YXVsdC1rZXk="), ("JWT_SECRET", "0123456789abcdef0123456789abcdef")];

fn with_required_vars() {
    for (key, value) in REQUIRED_VARS {
        unsafe {
            env::set_var(key, value);
        }
    }
}

fn clear_all_known_vars() {
    for key in [
        "VAULT_KEY",
        "JWT_SECRET",
        "DB_URL",
        "LISTEN_ADDR",
        "OBSERVABILITY_ENABLED",
        "RISK_PER_TRADE_MAX",
        "RISK_LEVERAGE_MAX",
        "RISK_DAILY_DD_SOFT",
        "RISK_DAILY_DD_HARD",
        "RISK_FRACTION",
        "AGGREGATOR_FRESHNESS_WINDOW_SECS",
        "AGGREGATOR_SOURCE_TIMEOUT_SECS",
        "CRYPTO_SOURCE_URL",
        "EQUITY_SOURCE_URL",
        "EQUITY_SOURCE_API_KEY",
        "FOREX_SOURCE_URL",
        "AI_PROVIDER_KEY",
        "SEED_BALANCE_USD",
    ] {
        unsafe {
            env::remove_var(key);
        }
    }
}

#[test]
fn loads_with_only_required_vars_set() {
    let _guard = env_lock().lock().unwrap();
    clear_all_known_vars();
    with_required_vars();

    let config = Config::from_env().unwrap();

    assert_eq!(config.seed_balance_usd, rust_decimal_macros::dec!(10000));
    assert!(config.ai_provider_key.is_none());
    assert_eq!(config.server.listen_addr, "0.0.0.0:8080");
    assert!(config.database.db_url.starts_with("sqlite://"));

    clear_all_known_vars();
}

#[test]
fn fails_fast_when_vault_key_missing() {
    let _guard = env_lock().lock().unwrap();
    clear_all_known_vars();
    unsafe {
        env::set_var("JWT_SECRET", "0123456789abcdef0123456789abcdef");
    }

    assert!(Config::from_env().is_err());

    clear_all_known_vars();
}

#[test]
fn fails_fast_when_jwt_secret_missing() {
    let _guard = env_lock().lock().unwrap();
    clear_all_known_vars();
    unsafe {
        env::set_var("VAULT_KEY", "dGVzdC12YXVsdC1rZXk=");
    }

    assert!(Config::from_env().is_err());

    clear_all_known_vars();
}

#[test]
fn picks_up_ai_provider_key_when_present() {
    let _guard = env_lock().lock().unwrap();
    clear_all_known_vars();
    with_required_vars();
    unsafe {
        env::set_var("AI_PROVIDER_KEY", "sk-test-key");
    }

    let config = Config::from_env().unwrap();
    assert_eq!(config.ai_provider_key.as_deref(), Some("sk-test-key"));

    clear_all_known_vars();
}

#[test]
fn treats_blank_ai_provider_key_as_absent() {
    let _guard = env_lock().lock().unwrap();
    clear_all_known_vars();
    with_required_vars();
    unsafe {
        env::set_var("AI_PROVIDER_KEY", "");
    }

    let config = Config::from_env().unwrap();
    assert!(config.ai_provider_key.is_none());

    clear_all_known_vars();
}

#[test]
fn honours_a_custom_seed_balance() {
    let _guard = env_lock().lock().unwrap();
    clear_all_known_vars();
    with_required_vars();
    unsafe {
        env::set_var("SEED_BALANCE_USD", "25000.50");
    }

    let config = Config::from_env().unwrap();
    assert_eq!(config.seed_balance_usd, rust_decimal_macros::dec!(25000.50));

    clear_all_known_vars();
}
