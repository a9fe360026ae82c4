//! Paper Trading Simulator (spec §4.3): an in-memory `ExchangeAdapter` that
//! never leaves the process. Market orders fill immediately at the
//! Aggregator's current quote with zero slippage; limit orders are queued
//! and checked against the Aggregator's cached quote on each status poll,
//! which stands in for "subsequent quote updates" without needing a
//! dedicated background matching task per adapter instance. Grounded on the
//! teacher's `application/simulator.rs` in spirit only — that file drives a
//! historical backtest loop, which this spec's Non-goals exclude; what
//! carries over is the idea of an execution path that prices fills off
//! fetched market data rather than a real order book.

use crate::domain::errors::AppError;
use crate::domain::order::{OrderSide, OrderType, TradeOrder};
use crate::domain::ports::{AdapterTestResult, AssetBalance, ExchangeAdapter, PlacedOrder, PlacedOrderStatus};
use crate::domain::quote::Quote;
use crate::infrastructure::market_data::MarketDataAggregator;
use async_trait::async_trait;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone)]
struct PendingOrder {
    symbol: String,
    side: OrderSide,
    limit_price: Decimal,
    status: PlacedOrderStatus,
    fill_price: Option<Decimal>,
}

pub struct PaperAdapter {
    aggregator: Arc<MarketDataAggregator>,
    balances: Mutex<HashMap<String, AssetBalance>>,
    pending: Mutex<HashMap<String, PendingOrder>>,
    next_order_id: AtomicU64,
}

impl PaperAdapter {
    pub fn new(aggregator: Arc<MarketDataAggregator>, seed_balances: HashMap<String, AssetBalance>) -> Self {
        Self {
            aggregator,
            balances: Mutex::new(seed_balances),
            pending: Mutex::new(HashMap::new()),
            next_order_id: AtomicU64::new(1),
        }
    }

    fn next_id(&self) -> String {
        format!("paper-{}", self.next_order_id.fetch_add(1, Ordering::SeqCst))
    }

    fn limit_satisfied(side: OrderSide, limit_price: Decimal, market_price: Decimal) -> bool {
        match side {
            OrderSide::Buy => market_price <= limit_price,
            OrderSide::Sell => market_price >= limit_price,
        }
    }
}

#[async_trait]
impl ExchangeAdapter for PaperAdapter {
    async fn test(&self) -> Result<AdapterTestResult, AppError> {
        Ok(AdapterTestResult {
            ok: true,
            latency_ms: 0,
            balance_snapshot: Some(
                self.balances.lock().iter().map(|(k, v)| (k.clone(), v.free + v.locked)).collect(),
            ),
            error: None,
        })
    }

    async fn balances(&self) -> Result<HashMap<String, AssetBalance>, AppError> {
        Ok(self.balances.lock().clone())
    }

    async fn ticker(&self, symbol: &str) -> Result<Quote, AppError> {
        self.aggregator.get_quote(symbol).await
    }

    async fn place_order(&self, order: &TradeOrder) -> Result<PlacedOrder, AppError> {
        let quote = self.aggregator.get_quote(&order.symbol).await?;

        match order.order_type {
            OrderType::Market => Ok(PlacedOrder {
                exchange_order_id: self.next_id(),
                fill_price: Some(quote.price),
                status: PlacedOrderStatus::Filled,
            }),
            OrderType::Limit => {
                let limit_price = order
                    .limit_price
                    .ok_or_else(|| AppError::validation("limit orders require limit_price"))?;
                let id = self.next_id();

                if Self::limit_satisfied(order.side, limit_price, quote.price) {
                    self.pending.lock().insert(
                        id.clone(),
                        PendingOrder {
                            symbol: order.symbol.clone(),
                            side: order.side,
                            limit_price,
                            status: PlacedOrderStatus::Filled,
                            fill_price: Some(quote.price),
                        },
                    );
                    Ok(PlacedOrder { exchange_order_id: id, fill_price: Some(quote.price), status: PlacedOrderStatus::Filled })
                } else {
                    self.pending.lock().insert(
                        id.clone(),
                        PendingOrder {
                            symbol: order.symbol.clone(),
                            side: order.side,
                            limit_price,
                            status: PlacedOrderStatus::Accepted,
                            fill_price: None,
                        },
                    );
                    Ok(PlacedOrder { exchange_order_id: id, fill_price: None, status: PlacedOrderStatus::Accepted })
                }
            }
            OrderType::StopLoss | OrderType::TakeProfit => {
                let stop_price = order
                    .stop_price
                    .ok_or_else(|| AppError::validation("stop orders require stop_price"))?;
                let id = self.next_id();
                self.pending.lock().insert(
                    id.clone(),
                    PendingOrder {
                        symbol: order.symbol.clone(),
                        side: order.side,
                        limit_price: stop_price,
                        status: PlacedOrderStatus::Accepted,
                        fill_price: None,
                    },
                );
                Ok(PlacedOrder { exchange_order_id: id, fill_price: None, status: PlacedOrderStatus::Accepted })
            }
        }
    }

    async fn cancel(&self, exchange_order_id: &str) -> Result<(), AppError> {
        let mut pending = self.pending.lock();
        match pending.get_mut(exchange_order_id) {
            Some(order) if order.status == PlacedOrderStatus::Accepted => {
                order.status = PlacedOrderStatus::Rejected;
                Ok(())
            }
            Some(_) => Err(AppError::conflict("order is already filled and cannot be cancelled")),
            None => Err(AppError::not_found(format!("no such paper order: {exchange_order_id}"))),
        }
    }

    async fn order_status(&self, exchange_order_id: &str) -> Result<PlacedOrderStatus, AppError> {
        let mut pending = self.pending.lock();
        let order = pending
            .get_mut(exchange_order_id)
            .ok_or_else(|| AppError::not_found(format!("no such paper order: {exchange_order_id}")))?;

        if order.status == PlacedOrderStatus::Accepted {
            if let Some(quote) = self.aggregator.cached_quote(&order.symbol)
                && Self::limit_satisfied(order.side, order.limit_price, quote.price)
            {
                order.status = PlacedOrderStatus::Filled;
                order.fill_price = Some(quote.price);
            }
        }

        Ok(order.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::OrderSide;
    use crate::infrastructure::circuit_breaker::CircuitBreakerRegistry;
    use crate::infrastructure::market_data::aggregator::AggregatorConfig;
    use crate::infrastructure::market_data::sources::SyntheticSource;
    use rust_decimal_macros::dec;
    use std::collections::HashMap as Map;

    fn adapter() -> PaperAdapter {
        let aggregator = Arc::new(MarketDataAggregator::new(
            Map::new(),
            Arc::new(SyntheticSource::new()),
            Arc::new(CircuitBreakerRegistry::default()),
            AggregatorConfig::default(),
        ));
        PaperAdapter::new(aggregator, Map::new())
    }

    fn market_order(symbol: &str, side: OrderSide, quantity: Decimal) -> TradeOrder {
        TradeOrder {
            owner_id: "u1".into(),
            symbol: symbol.into(),
            side,
            order_type: OrderType::Market,
            quantity,
            limit_price: None,
            stop_price: None,
            platform_id: None,
            idempotency_key: None,
        }
    }

    #[tokio::test]
    async fn market_orders_fill_immediately_at_quote_price() {
        let adapter = adapter();
        let placed = adapter.place_order(&market_order("BTCUSDT", OrderSide::Buy, dec!(0.01))).await.unwrap();
        assert_eq!(placed.status, PlacedOrderStatus::Filled);
        assert!(placed.fill_price.is_some());
    }

    #[tokio::test]
    async fn unsatisfied_limit_orders_stay_accepted_until_polled() {
        let adapter = adapter();
        let mut order = market_order("BTCUSDT", OrderSide::Buy, dec!(0.01));
        order.order_type = OrderType::Limit;
        order.limit_price = Some(dec!(1)); // far below any synthetic quote
        let placed = adapter.place_order(&order).await.unwrap();
        assert_eq!(placed.status, PlacedOrderStatus::Accepted);
        assert_eq!(adapter.order_status(&placed.exchange_order_id).await.unwrap(), PlacedOrderStatus::Accepted);
    }

    #[tokio::test]
    async fn cancel_rejects_a_pending_order() {
        let adapter = adapter();
        let mut order = market_order("BTCUSDT", OrderSide::Buy, dec!(0.01));
        order.order_type = OrderType::Limit;
        order.limit_price = Some(dec!(1));
        let placed = adapter.place_order(&order).await.unwrap();
        adapter.cancel(&placed.exchange_order_id).await.unwrap();
        assert_eq!(adapter.order_status(&placed.exchange_order_id).await.unwrap(), PlacedOrderStatus::Rejected);
    }
}
