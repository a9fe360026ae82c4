//! Scenario: a user with no connected live platform submits a market buy;
//! the order executes against the paper platform at the current aggregator
//! quote and the notional is moved from available into invested balance.

use crate::support;
use rust_decimal_macros::dec;
use vaultrade::application::router::SubmissionOutcome;
use vaultrade::domain::mode::OperatingMode;
use vaultrade::domain::order::{OrderSide, OrderType, TradeOrder};
use vaultrade::domain::trade::ExecutionKind;
use vaultrade::infrastructure::market_data::aggregator::{AggregatorConfig, MarketDataAggregator};
use vaultrade::infrastructure::circuit_breaker::CircuitBreakerRegistry;
use vaultrade::infrastructure::market_data::sources::SyntheticSource;
use std::collections::HashMap;
use std::sync::Arc;

#[tokio::test]
async fn paper_fallback_when_no_live_platform() {
    let harness = support::router_with_seeded_portfolio("u1").await;
    let user = support::user("u1", OperatingMode::Autopilot);

    let reference_aggregator = MarketDataAggregator::new(
        HashMap::new(),
        Arc::new(SyntheticSource::new()),
        Arc::new(CircuitBreakerRegistry::default()),
        AggregatorConfig::default(),
    );
    let expected_quote = reference_aggregator.get_quote("BTCUSDT").await.unwrap();

    let order = TradeOrder {
        owner_id: "u1".to_string(),
        symbol: "BTCUSDT".to_string(),
        side: OrderSide::Buy,
        order_type: OrderType::Market,
        quantity: dec!(0.01),
        limit_price: None,
        stop_price: None,
        platform_id: None,
        idempotency_key: None,
    };

    let outcome = harness.router.submit_order(&user, order).await.unwrap();
    let trade = match outcome {
        SubmissionOutcome::Executed(trade) => trade,
        other => panic!("expected Executed, got {other:?}"),
    };

    assert_eq!(trade.execution_kind, ExecutionKind::Paper);
    assert_eq!(trade.market_price_at_execution, expected_quote.price);

    let portfolio = harness.portfolios.snapshot("u1").await.unwrap();
    let expected_notional = dec!(0.01) * expected_quote.price;
    assert_eq!(portfolio.available_balance, dec!(10000) - expected_notional);
    assert_eq!(portfolio.invested_balance, expected_notional);
}
