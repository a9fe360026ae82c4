//! Binance `ExchangeAdapter`, grounded on the teacher's
//! `infrastructure/binance/execution.rs` (HMAC-SHA256 query signing via
//! `hmac`+`sha2`, `X-MBX-APIKEY` header, `ClientWithMiddleware`). Generalized
//! from `ExecutionService` (teacher's own single-tenant trait) to the spec's
//! `ExchangeAdapter` trait surface, with upstream failures translated into
//! the `AppError` taxonomy per spec §4.3(a) rather than left as `anyhow`.

use crate::domain::errors::AppError;
use crate::domain::order::{OrderSide, OrderType, TradeOrder};
use crate::domain::platform::PlatformCredentials;
use crate::domain::ports::{AdapterTestResult, AssetBalance, ExchangeAdapter, PlacedOrder, PlacedOrderStatus};
use crate::domain::quote::{AssetClass, Quote};
use crate::infrastructure::http_client_factory::HttpClientFactory;
use async_trait::async_trait;
use hmac::{Hmac, Mac};
use reqwest_middleware::ClientWithMiddleware;
use rust_decimal::Decimal;
use serde::Deserialize;
use sha2::Sha256;
use std::collections::HashMap;
use std::time::{Duration, Instant};

type HmacSha256 = Hmac<Sha256>;

pub struct BinanceAdapter {
    client: ClientWithMiddleware,
    api_key: String,
    api_secret: String,
    base_url: String,
}

impl BinanceAdapter {
    pub fn new(base_url: impl Into<String>, credentials: &PlatformCredentials) -> Self {
        Self {
            client: HttpClientFactory::with_timeout(Duration::from_secs(10)),
            api_key: credentials.api_key.clone(),
            api_secret: credentials.secret_key.clone(),
            base_url: base_url.into(),
        }
    }

    fn sign(&self, query_string: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(self.api_secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(query_string.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    fn signed_query(&self, params: &[(&str, String)]) -> String {
        let query_string: String =
            params.iter().map(|(k, v)| format!("{k}={v}")).collect::<Vec<_>>().join("&");
        let signature = self.sign(&query_string);
        format!("{query_string}&signature={signature}")
    }
}

#[async_trait]
impl ExchangeAdapter for BinanceAdapter {
    async fn test(&self) -> Result<AdapterTestResult, AppError> {
        let started = Instant::now();
        match self.balances().await {
            Ok(balances) => Ok(AdapterTestResult {
                ok: true,
                latency_ms: started.elapsed().as_millis() as u64,
                balance_snapshot: Some(balances.into_iter().map(|(k, v)| (k, v.free + v.locked)).collect()),
                error: None,
            }),
            Err(err) => Ok(AdapterTestResult {
                ok: false,
                latency_ms: started.elapsed().as_millis() as u64,
                balance_snapshot: None,
                error: Some(err.to_string()),
            }),
        }
    }

    async fn balances(&self) -> Result<HashMap<String, AssetBalance>, AppError> {
        let timestamp = chrono::Utc::now().timestamp_millis();
        let signed = self.signed_query(&[("timestamp", timestamp.to_string())]);
        let url = format!("{}/api/v3/account?{}", self.base_url, signed);

        let response = self
            .client
            .get(&url)
            .header("X-MBX-APIKEY", &self.api_key)
            .send()
            .await
            .map_err(|e| AppError::upstream(format!("binance account fetch failed: {e}"), true))?;

        if !response.status().is_success() {
            return Err(classify_error_response(response).await);
        }

        #[derive(Debug, Deserialize)]
        struct Balance {
            asset: String,
            free: String,
            locked: String,
        }
        #[derive(Debug, Deserialize)]
        struct Account {
            balances: Vec<Balance>,
        }

        let account: Account = response
            .json()
            .await
            .map_err(|e| AppError::upstream(format!("binance account parse failure: {e}"), false))?;

        Ok(account
            .balances
            .into_iter()
            .map(|b| {
                (
                    b.asset,
                    AssetBalance {
                        free: b.free.parse().unwrap_or(Decimal::ZERO),
                        locked: b.locked.parse().unwrap_or(Decimal::ZERO),
                    },
                )
            })
            .filter(|(_, bal)| bal.free + bal.locked > Decimal::ZERO)
            .collect())
    }

    async fn ticker(&self, symbol: &str) -> Result<Quote, AppError> {
        let url = format!("{}/api/v3/ticker/price?symbol={}", self.base_url, symbol);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::upstream(format!("binance ticker fetch failed: {e}"), true))?;

        if !response.status().is_success() {
            return Err(classify_error_response(response).await);
        }

        #[derive(Debug, Deserialize)]
        struct PriceTicker {
            price: String,
        }
        let ticker: PriceTicker = response
            .json()
            .await
            .map_err(|e| AppError::upstream(format!("binance ticker parse failure: {e}"), false))?;
        let price = ticker
            .price
            .parse::<Decimal>()
            .map_err(|_| AppError::upstream("binance returned a non-numeric price", false))?;

        Ok(Quote {
            symbol: symbol.to_string(),
            price,
            change_24h_pct: Decimal::ZERO,
            volume_24h: Decimal::ZERO,
            high_24h: price,
            low_24h: price,
            asset_class: AssetClass::Crypto,
            source_tag: "adapter:binance".to_string(),
            fetched_at: chrono::Utc::now(),
            fetched_monotonic: Some(Instant::now()),
        })
    }

    async fn place_order(&self, order: &TradeOrder) -> Result<PlacedOrder, AppError> {
        let side = match order.side {
            OrderSide::Buy => "BUY",
            OrderSide::Sell => "SELL",
        };
        let order_type = match order.order_type {
            OrderType::Market => "MARKET",
            OrderType::Limit => "LIMIT",
            OrderType::StopLoss => "STOP_LOSS",
            OrderType::TakeProfit => "TAKE_PROFIT",
        };

        let timestamp = chrono::Utc::now().timestamp_millis();
        let mut params = vec![
            ("symbol", order.symbol.clone()),
            ("side", side.to_string()),
            ("type", order_type.to_string()),
            ("quantity", order.quantity.to_string()),
            ("timestamp", timestamp.to_string()),
        ];
        if let Some(limit_price) = order.limit_price {
            params.push(("price", limit_price.to_string()));
            params.push(("timeInForce", "GTC".to_string()));
        }

        let signed = self.signed_query(&params);
        let url = format!("{}/api/v3/order?{}", self.base_url, signed);

        let response = self
            .client
            .post(&url)
            .header("X-MBX-APIKEY", &self.api_key)
            .send()
            .await
            .map_err(|e| AppError::upstream(format!("binance order placement failed: {e}"), true))?;

        if !response.status().is_success() {
            return Err(classify_error_response(response).await);
        }

        #[derive(Debug, Deserialize)]
        struct OrderResponse {
            #[serde(rename = "orderId")]
            order_id: i64,
            status: String,
            price: Option<String>,
        }
        let parsed: OrderResponse = response
            .json()
            .await
            .map_err(|e| AppError::upstream(format!("binance order response parse failure: {e}"), false))?;

        Ok(PlacedOrder {
            exchange_order_id: parsed.order_id.to_string(),
            fill_price: parsed.price.and_then(|p| p.parse().ok()),
            status: match parsed.status.as_str() {
                "FILLED" => PlacedOrderStatus::Filled,
                "PARTIALLY_FILLED" => PlacedOrderStatus::PartiallyFilled,
                "NEW" => PlacedOrderStatus::Accepted,
                _ => PlacedOrderStatus::Rejected,
            },
        })
    }

    async fn cancel(&self, exchange_order_id: &str) -> Result<(), AppError> {
        let timestamp = chrono::Utc::now().timestamp_millis();
        let signed = self.signed_query(&[
            ("orderId", exchange_order_id.to_string()),
            ("timestamp", timestamp.to_string()),
        ]);
        let url = format!("{}/api/v3/order?{}", self.base_url, signed);

        let response = self
            .client
            .delete(&url)
            .header("X-MBX-APIKEY", &self.api_key)
            .send()
            .await
            .map_err(|e| AppError::upstream(format!("binance cancel failed: {e}"), true))?;

        if !response.status().is_success() {
            return Err(classify_error_response(response).await);
        }
        Ok(())
    }

    async fn order_status(&self, exchange_order_id: &str) -> Result<PlacedOrderStatus, AppError> {
        let timestamp = chrono::Utc::now().timestamp_millis();
        let signed = self.signed_query(&[
            ("orderId", exchange_order_id.to_string()),
            ("timestamp", timestamp.to_string()),
        ]);
        let url = format!("{}/api/v3/order?{}", self.base_url, signed);

        let response = self
            .client
            .get(&url)
            .header("X-MBX-APIKEY", &self.api_key)
            .send()
            .await
            .map_err(|e| AppError::upstream(format!("binance order status fetch failed: {e}"), true))?;

        if !response.status().is_success() {
            return Err(classify_error_response(response).await);
        }

        #[derive(Debug, Deserialize)]
        struct StatusResponse {
            status: String,
        }
        let parsed: StatusResponse = response
            .json()
            .await
            .map_err(|e| AppError::upstream(format!("binance order status parse failure: {e}"), false))?;

        Ok(match parsed.status.as_str() {
            "FILLED" => PlacedOrderStatus::Filled,
            "PARTIALLY_FILLED" => PlacedOrderStatus::PartiallyFilled,
            "NEW" => PlacedOrderStatus::Accepted,
            _ => PlacedOrderStatus::Rejected,
        })
    }
}

fn classify_status(status: reqwest::StatusCode) -> AppError {
    match status.as_u16() {
        401 | 403 => AppError::auth("binance rejected the supplied API credentials"),
        429 => AppError::upstream("binance rate limit exceeded", true),
        400..=499 => AppError::upstream(format!("binance rejected the request: {status}"), false),
        _ => AppError::upstream(format!("binance returned {status}"), true),
    }
}

#[derive(Debug, Deserialize)]
struct BinanceErrorBody {
    code: Option<i64>,
    msg: Option<String>,
}

/// Classifies a non-2xx response by its Binance `{code, msg}` body before
/// falling back to `classify_status`, so a user-caused rejection (no funds,
/// market not open) doesn't count toward the exchange's circuit breakers the
/// way a real outage does (spec §4.3(a)'s `InsufficientFundsError`/
/// `MarketClosedError`). Code `-2010` is Binance's documented
/// "account has insufficient balance for requested action".
async fn classify_error_response(response: reqwest::Response) -> AppError {
    let status = response.status();
    match response.json::<BinanceErrorBody>().await {
        Ok(body) => classify_error_body(status, body.code, body.msg),
        Err(_) => classify_status(status),
    }
}

fn classify_error_body(status: reqwest::StatusCode, code: Option<i64>, msg: Option<String>) -> AppError {
    if code == Some(-2010) {
        return AppError::insufficient_funds(msg.unwrap_or_else(|| "binance reported insufficient balance".to_string()));
    }
    if let Some(msg) = &msg {
        let lower = msg.to_lowercase();
        if lower.contains("insufficient balance") || lower.contains("insufficient funds") {
            return AppError::insufficient_funds(msg.clone());
        }
        if lower.contains("market is closed") || lower.contains("no trading is allowed") {
            return AppError::market_closed(msg.clone());
        }
    }
    classify_status(status)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_adapter() -> BinanceAdapter {
        BinanceAdapter::new(
            "https://api.binance.com",
            &PlatformCredentials { api_key: "k".into(), secret_key: "s".into(), passphrase: None },
        )
    }

    #[test]
    fn signature_is_64_hex_chars() {
        let adapter = test_adapter();
        let signature = adapter.sign("symbol=BTCUSDT&side=BUY&type=MARKET&quantity=0.001&timestamp=1234567890");
        assert_eq!(signature.len(), 64);
        assert!(signature.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn classifies_auth_failures() {
        assert!(matches!(classify_status(reqwest::StatusCode::UNAUTHORIZED), AppError::Auth { .. }));
    }

    #[test]
    fn classifies_rate_limit_as_retryable_upstream() {
        match classify_status(reqwest::StatusCode::TOO_MANY_REQUESTS) {
            AppError::Upstream { retryable, .. } => assert!(retryable),
            other => panic!("expected Upstream, got {other:?}"),
        }
    }

    #[test]
    fn classifies_dash_2010_as_insufficient_funds_not_upstream() {
        let err = classify_error_body(
            reqwest::StatusCode::BAD_REQUEST,
            Some(-2010),
            Some("Account has insufficient balance for requested action.".to_string()),
        );
        assert!(matches!(err, AppError::InsufficientFunds { .. }));
        assert!(!err.counts_toward_breaker());
    }

    #[test]
    fn classifies_market_closed_message_by_content() {
        let err = classify_error_body(
            reqwest::StatusCode::BAD_REQUEST,
            Some(-1013),
            Some("Market is closed.".to_string()),
        );
        assert!(matches!(err, AppError::MarketClosed { .. }));
        assert!(!err.counts_toward_breaker());
    }

    #[test]
    fn unrecognized_error_body_falls_back_to_status_classification() {
        let err = classify_error_body(reqwest::StatusCode::INTERNAL_SERVER_ERROR, Some(-1000), Some("unknown".to_string()));
        assert!(matches!(err, AppError::Upstream { .. }));
        assert!(err.counts_toward_breaker());
    }
}
