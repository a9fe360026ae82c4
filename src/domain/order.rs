use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderSide {
    Buy,
    Sell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    Market,
    Limit,
    StopLoss,
    TakeProfit,
}

/// A proposed order, ephemeral until accepted by the Trade Router (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeOrder {
    pub owner_id: String,
    pub symbol: String,
    pub side: OrderSide,
    pub order_type: OrderType,
    pub quantity: Decimal,
    pub limit_price: Option<Decimal>,
    pub stop_price: Option<Decimal>,
    pub platform_id: Option<String>,
    pub idempotency_key: Option<String>,
}

impl TradeOrder {
    pub fn validate(&self) -> Result<(), String> {
        if self.quantity <= Decimal::ZERO {
            return Err("quantity must be positive".to_string());
        }
        if self.symbol.trim().is_empty() {
            return Err("symbol must not be empty".to_string());
        }
        if matches!(self.order_type, OrderType::Limit) && self.limit_price.is_none() {
            return Err("limit orders require limit_price".to_string());
        }
        if matches!(self.order_type, OrderType::StopLoss | OrderType::TakeProfit)
            && self.stop_price.is_none()
        {
            return Err("stop orders require stop_price".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn base_order() -> TradeOrder {
        TradeOrder {
            owner_id: "u1".into(),
            symbol: "BTCUSDT".into(),
            side: OrderSide::Buy,
            order_type: OrderType::Market,
            quantity: dec!(0.01),
            limit_price: None,
            stop_price: None,
            platform_id: None,
            idempotency_key: None,
        }
    }

    #[test]
    fn rejects_non_positive_quantity() {
        let mut order = base_order();
        order.quantity = dec!(0);
        assert!(order.validate().is_err());
    }

    #[test]
    fn limit_order_requires_price() {
        let mut order = base_order();
        order.order_type = OrderType::Limit;
        assert!(order.validate().is_err());
        order.limit_price = Some(dec!(60000));
        assert!(order.validate().is_ok());
    }
}
