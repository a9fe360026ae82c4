//! Scenario: a portfolio already past the hard daily-drawdown limit refuses
//! every further submission and trips the per-user kill switch, rather than
//! relying on the risk engine's pre-trade scoring alone.

use crate::support;
use rust_decimal_macros::dec;
use vaultrade::application::router::SubmissionOutcome;
use vaultrade::domain::errors::AppError;
use vaultrade::domain::mode::OperatingMode;
use vaultrade::domain::order::{OrderSide, OrderType, TradeOrder};
use vaultrade::domain::portfolio::Portfolio;
use vaultrade::domain::ports::TradeRepository;

fn breached_portfolio(owner_id: &str) -> Portfolio {
    let mut portfolio = Portfolio::new(owner_id, dec!(10000));
    // 6% intraday loss against a 5% hard limit (RiskLimits::default).
    portfolio.daily_pnl = dec!(-600);
    portfolio
}

fn order() -> TradeOrder {
    TradeOrder {
        owner_id: "u1".to_string(),
        symbol: "BTCUSDT".to_string(),
        side: OrderSide::Buy,
        order_type: OrderType::Market,
        quantity: dec!(0.01),
        limit_price: None,
        stop_price: None,
        platform_id: None,
        idempotency_key: None,
    }
}

#[tokio::test]
async fn hard_drawdown_breach_halts_the_account() {
    let harness = support::router_with_portfolio(breached_portfolio("u1")).await;
    let user = support::user("u1", OperatingMode::Autopilot);

    assert!(!harness.router.user_kill_switch_engaged("u1"));

    let err = harness.router.submit_order(&user, order()).await.unwrap_err();
    assert!(matches!(err, AppError::RiskDenied { .. }));
    assert!(format!("{err}").contains("risk denied"));

    assert!(harness.router.user_kill_switch_engaged("u1"));

    // A second submission is rejected at the kill-switch check, before the
    // risk engine or any adapter is ever consulted again.
    let second = harness.router.submit_order(&user, order()).await.unwrap_err();
    assert!(matches!(second, AppError::Forbidden { .. }));

    assert!(harness.trades.list_for_owner("u1").await.unwrap().is_empty());
}

#[tokio::test]
async fn learning_only_mode_also_observes_the_hard_limit() {
    let harness = support::router_with_portfolio(breached_portfolio("u1")).await;
    let user = support::user("u1", OperatingMode::LearningOnly);

    let outcome = harness.router.submit_order(&user, order()).await;
    match outcome {
        Err(AppError::RiskDenied { .. }) => {}
        other => panic!("expected RiskDenied, got {other:?}"),
    }
    assert!(harness.router.user_kill_switch_engaged("u1"));
}

#[tokio::test]
async fn day_boundary_roll_releases_the_kill_switch() {
    let harness = support::router_with_portfolio(breached_portfolio("u1")).await;
    let user = support::user("u1", OperatingMode::Autopilot);

    harness.router.submit_order(&user, order()).await.unwrap_err();
    assert!(harness.router.user_kill_switch_engaged("u1"));

    // Simulate the bootstrap day-boundary task: roll every portfolio forward
    // and release every per-user hard-drawdown kill switch.
    harness.portfolios.roll_all_trading_days().await;
    harness.router.release_daily_kill_switches().await;

    assert!(!harness.router.user_kill_switch_engaged("u1"));

    let portfolio = harness.portfolios.snapshot("u1").await.unwrap();
    assert_eq!(portfolio.daily_pnl, dec!(0));

    // A fresh day, a clean drawdown: submissions go through again.
    let outcome = harness.router.submit_order(&user, order()).await.unwrap();
    assert!(matches!(outcome, SubmissionOutcome::Executed(_)));
}
