//! Scenario: an `Assisted`-mode order sits unapproved past its TTL. The
//! sweep cancels it before it ever reaches an adapter and notifies the
//! owner, rather than leaving it executable indefinitely.

use crate::support;
use rust_decimal_macros::dec;
use std::time::Duration;
use vaultrade::application::router::SubmissionOutcome;
use vaultrade::domain::mode::OperatingMode;
use vaultrade::domain::order::{OrderSide, OrderType, TradeOrder};
use vaultrade::domain::ports::{NotificationRepository, TradeRepository};

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
async fn expired_approval_is_swept_and_never_executes() {
    let mut harness = support::router_with_seeded_portfolio("u1").await;
    harness.router = harness.router.with_approval_ttl(Duration::from_millis(1));
    let user = support::user("u1", OperatingMode::Assisted);

    let outcome = harness.router.submit_order(&user, order()).await.unwrap();
    let approval_id = match outcome {
        SubmissionOutcome::PendingApproval { approval_id, .. } => approval_id,
        other => panic!("expected PendingApproval, got {other:?}"),
    };

    assert_eq!(harness.router.pending_approvals_for("u1").len(), 1);

    tokio::time::sleep(Duration::from_millis(5)).await;
    harness.router.expire_stale_approvals().await;

    assert!(harness.router.pending_approvals_for("u1").is_empty());

    let err = harness.router.approve_pending(&user, &approval_id).await.unwrap_err();
    assert!(format!("{err}").to_lowercase().contains("no such pending approval"));

    assert!(harness.trades.list_for_owner("u1").await.unwrap().is_empty());

    let notifications = harness.notifications.list_for_owner("u1").await.unwrap();
    assert!(notifications.iter().any(|n| n.body.contains("expired")));
}
