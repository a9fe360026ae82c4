use crate::domain::order::{OrderSide, OrderType};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeStatus {
    Open,
    Closed,
    Cancelled,
}

/// Whether a trade actually hit a live exchange or was simulated against
/// market quotes (spec Glossary).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionKind {
    Paper,
    Live,
}

/// An executed trade record (spec §3). Append-only once written; closing a
/// trade writes `exit_price`/`closed_at`/`pnl`, it never deletes the row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    pub id: String,
    pub owner_id: String,
    pub platform_id: Option<String>,
    pub symbol: String,
    pub side: OrderSide,
    pub order_type: OrderType,
    pub quantity: Decimal,
    pub entry_price: Decimal,
    pub exit_price: Option<Decimal>,
    pub stop_loss: Option<Decimal>,
    pub take_profit: Option<Decimal>,
    pub status: TradeStatus,
    pub pnl: Decimal,
    pub execution_kind: ExecutionKind,
    pub market_price_at_execution: Decimal,
    pub exchange_order_id: Option<String>,
    pub idempotency_key: Option<String>,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

impl Trade {
    pub fn notional(&self) -> Decimal {
        self.quantity * self.entry_price
    }

    /// Realized P&L on close, given an exit price. Positive for a profitable
    /// long close or profitable short close; sign handled by side.
    pub fn realized_pnl(&self, exit_price: Decimal) -> Decimal {
        match self.side {
            OrderSide::Buy => (exit_price - self.entry_price) * self.quantity,
            OrderSide::Sell => (self.entry_price - exit_price) * self.quantity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn open_trade(side: OrderSide, entry: Decimal, qty: Decimal) -> Trade {
        Trade {
            id: "t1".into(),
            owner_id: "u1".into(),
            platform_id: None,
            symbol: "BTCUSDT".into(),
            side,
            order_type: OrderType::Market,
            quantity: qty,
            entry_price: entry,
            exit_price: None,
            stop_loss: None,
            take_profit: None,
            status: TradeStatus::Open,
            pnl: Decimal::ZERO,
            execution_kind: ExecutionKind::Paper,
            market_price_at_execution: entry,
            exchange_order_id: None,
            idempotency_key: None,
            created_at: Utc::now(),
            closed_at: None,
        }
    }

    #[test]
    fn realized_pnl_long_profit() {
        let trade = open_trade(OrderSide::Buy, dec!(100), dec!(10));
        assert_eq!(trade.realized_pnl(dec!(110)), dec!(100));
    }

    #[test]
    fn realized_pnl_short_profit() {
        let trade = open_trade(OrderSide::Sell, dec!(100), dec!(10));
        assert_eq!(trade.realized_pnl(dec!(90)), dec!(100));
    }
}
