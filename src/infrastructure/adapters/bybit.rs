//! Bybit `ExchangeAdapter`. Same trait surface and wire-shape translation as
//! `binance.rs`, signing scheme adapted to Bybit's documented v5 auth: HMAC-
//! SHA256 over `timestamp + api_key + recv_window + body` (query string for
//! GET, JSON body for POST), hex-encoded into the `X-BAPI-SIGN` header.

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

const RECV_WINDOW_MS: &str = "5000";

pub struct BybitAdapter {
    client: ClientWithMiddleware,
    api_key: String,
    api_secret: String,
    base_url: String,
}

impl BybitAdapter {
    pub fn new(base_url: impl Into<String>, credentials: &PlatformCredentials) -> Self {
        Self {
            client: HttpClientFactory::with_timeout(Duration::from_secs(10)),
            api_key: credentials.api_key.clone(),
            api_secret: credentials.secret_key.clone(),
            base_url: base_url.into(),
        }
    }

    fn sign(&self, timestamp: &str, payload: &str) -> String {
        let prehash = format!("{}{}{}{}", timestamp, self.api_key, RECV_WINDOW_MS, payload);
        let mut mac = HmacSha256::new_from_slice(self.api_secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(prehash.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    fn auth_headers(&self, payload: &str) -> Vec<(&'static str, String)> {
        let timestamp = chrono::Utc::now().timestamp_millis().to_string();
        let signature = self.sign(&timestamp, payload);
        vec![
            ("X-BAPI-API-KEY", self.api_key.clone()),
            ("X-BAPI-TIMESTAMP", timestamp),
            ("X-BAPI-RECV-WINDOW", RECV_WINDOW_MS.to_string()),
            ("X-BAPI-SIGN", signature),
        ]
    }
}

#[async_trait]
impl ExchangeAdapter for BybitAdapter {
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
        let query = "accountType=UNIFIED";
        let url = format!("{}/v5/account/wallet-balance?{}", self.base_url, query);

        let mut request = self.client.get(&url);
        for (name, value) in self.auth_headers(query) {
            request = request.header(name, value);
        }
        let response = request
            .send()
            .await
            .map_err(|e| AppError::upstream(format!("bybit wallet-balance fetch failed: {e}"), true))?;

        if !response.status().is_success() {
            return Err(classify_error_response(response).await);
        }

        #[derive(Debug, Deserialize)]
        struct Coin {
            coin: String,
            #[serde(rename = "walletBalance")]
            wallet_balance: String,
            locked: String,
        }
        #[derive(Debug, Deserialize)]
        struct AccountEntry {
            coin: Vec<Coin>,
        }
        #[derive(Debug, Deserialize)]
        struct Result_ {
            list: Vec<AccountEntry>,
        }
        #[derive(Debug, Deserialize)]
        struct WalletBalanceResponse {
            result: Result_,
        }

        let parsed: WalletBalanceResponse = response
            .json()
            .await
            .map_err(|e| AppError::upstream(format!("bybit wallet-balance parse failure: {e}"), false))?;

        Ok(parsed
            .result
            .list
            .into_iter()
            .flat_map(|entry| entry.coin)
            .map(|c| {
                let locked: Decimal = c.locked.parse().unwrap_or(Decimal::ZERO);
                let total: Decimal = c.wallet_balance.parse().unwrap_or(Decimal::ZERO);
                (c.coin, AssetBalance { free: total - locked, locked })
            })
            .filter(|(_, bal)| bal.free + bal.locked > Decimal::ZERO)
            .collect())
    }

    async fn ticker(&self, symbol: &str) -> Result<Quote, AppError> {
        let url = format!("{}/v5/market/tickers?category=spot&symbol={}", self.base_url, symbol);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::upstream(format!("bybit ticker fetch failed: {e}"), true))?;

        if !response.status().is_success() {
            return Err(classify_error_response(response).await);
        }

        #[derive(Debug, Deserialize)]
        struct TickerEntry {
            #[serde(rename = "lastPrice")]
            last_price: String,
        }
        #[derive(Debug, Deserialize)]
        struct Result_ {
            list: Vec<TickerEntry>,
        }
        #[derive(Debug, Deserialize)]
        struct TickerResponse {
            result: Result_,
        }

        let parsed: TickerResponse = response
            .json()
            .await
            .map_err(|e| AppError::upstream(format!("bybit ticker parse failure: {e}"), false))?;
        let entry = parsed
            .result
            .list
            .first()
            .ok_or_else(|| AppError::upstream("bybit returned no ticker entries", true))?;
        let price = entry
            .last_price
            .parse::<Decimal>()
            .map_err(|_| AppError::upstream("bybit returned a non-numeric price", false))?;

        Ok(Quote {
            symbol: symbol.to_string(),
            price,
            change_24h_pct: Decimal::ZERO,
            volume_24h: Decimal::ZERO,
            high_24h: price,
            low_24h: price,
            asset_class: AssetClass::Crypto,
            source_tag: "adapter:bybit".to_string(),
            fetched_at: chrono::Utc::now(),
            fetched_monotonic: Some(Instant::now()),
        })
    }

    async fn place_order(&self, order: &TradeOrder) -> Result<PlacedOrder, AppError> {
        let side = match order.side {
            OrderSide::Buy => "Buy",
            OrderSide::Sell => "Sell",
        };
        let order_type = match order.order_type {
            OrderType::Market => "Market",
            OrderType::Limit => "Limit",
            OrderType::StopLoss | OrderType::TakeProfit => "Market",
        };

        let body = serde_json::json!({
            "category": "spot",
            "symbol": order.symbol,
            "side": side,
            "orderType": order_type,
            "qty": order.quantity.to_string(),
            "price": order.limit_price.map(|p| p.to_string()),
        })
        .to_string();

        let url = format!("{}/v5/order/create", self.base_url);
        let mut request = self.client.post(&url).body(body.clone());
        for (name, value) in self.auth_headers(&body) {
            request = request.header(name, value);
        }
        let response = request
            .send()
            .await
            .map_err(|e| AppError::upstream(format!("bybit order placement failed: {e}"), true))?;

        if !response.status().is_success() {
            return Err(classify_error_response(response).await);
        }

        #[derive(Debug, Deserialize)]
        struct OrderResult {
            #[serde(rename = "orderId")]
            order_id: String,
        }
        #[derive(Debug, Deserialize)]
        struct OrderResponse {
            result: OrderResult,
        }
        let parsed: OrderResponse = response
            .json()
            .await
            .map_err(|e| AppError::upstream(format!("bybit order response parse failure: {e}"), false))?;

        Ok(PlacedOrder {
            exchange_order_id: parsed.result.order_id,
            fill_price: None,
            status: PlacedOrderStatus::Accepted,
        })
    }

    async fn cancel(&self, exchange_order_id: &str) -> Result<(), AppError> {
        let body = serde_json::json!({ "category": "spot", "orderId": exchange_order_id }).to_string();
        let url = format!("{}/v5/order/cancel", self.base_url);
        let mut request = self.client.post(&url).body(body.clone());
        for (name, value) in self.auth_headers(&body) {
            request = request.header(name, value);
        }
        let response = request
            .send()
            .await
            .map_err(|e| AppError::upstream(format!("bybit cancel failed: {e}"), true))?;

        if !response.status().is_success() {
            return Err(classify_error_response(response).await);
        }
        Ok(())
    }

    async fn order_status(&self, exchange_order_id: &str) -> Result<PlacedOrderStatus, AppError> {
        let query = format!("category=spot&orderId={exchange_order_id}");
        let url = format!("{}/v5/order/realtime?{}", self.base_url, query);
        let mut request = self.client.get(&url);
        for (name, value) in self.auth_headers(&query) {
            request = request.header(name, value);
        }
        let response = request
            .send()
            .await
            .map_err(|e| AppError::upstream(format!("bybit order status fetch failed: {e}"), true))?;

        if !response.status().is_success() {
            return Err(classify_error_response(response).await);
        }

        #[derive(Debug, Deserialize)]
        struct OrderEntry {
            #[serde(rename = "orderStatus")]
            order_status: String,
        }
        #[derive(Debug, Deserialize)]
        struct Result_ {
            list: Vec<OrderEntry>,
        }
        #[derive(Debug, Deserialize)]
        struct StatusResponse {
            result: Result_,
        }
        let parsed: StatusResponse = response
            .json()
            .await
            .map_err(|e| AppError::upstream(format!("bybit order status parse failure: {e}"), false))?;

        Ok(match parsed.result.list.first().map(|e| e.order_status.as_str()) {
            Some("Filled") => PlacedOrderStatus::Filled,
            Some("PartiallyFilled") => PlacedOrderStatus::PartiallyFilled,
            Some("New") | Some("Created") => PlacedOrderStatus::Accepted,
            _ => PlacedOrderStatus::Rejected,
        })
    }
}

fn classify_status(status: reqwest::StatusCode) -> AppError {
    match status.as_u16() {
        401 | 403 => AppError::auth("bybit rejected the supplied API credentials"),
        429 => AppError::upstream("bybit rate limit exceeded", true),
        400..=499 => AppError::upstream(format!("bybit rejected the request: {status}"), false),
        _ => AppError::upstream(format!("bybit returned {status}"), true),
    }
}

#[derive(Debug, Deserialize)]
struct BybitErrorBody {
    #[serde(rename = "retCode")]
    ret_code: Option<i64>,
    #[serde(rename = "retMsg")]
    ret_msg: Option<String>,
}

/// Classifies a non-2xx response by Bybit's `{retCode, retMsg}` body before
/// falling back to `classify_status`, mirroring `binance.rs`'s
/// `classify_error_response` so a user-caused rejection doesn't trip the
/// shared exchange circuit breakers the way a real outage does.
async fn classify_error_response(response: reqwest::Response) -> AppError {
    let status = response.status();
    match response.json::<BybitErrorBody>().await {
        Ok(body) => classify_error_body(status, body.ret_msg),
        Err(_) => classify_status(status),
    }
}

fn classify_error_body(status: reqwest::StatusCode, ret_msg: Option<String>) -> AppError {
    if let Some(msg) = &ret_msg {
        let lower = msg.to_lowercase();
        if lower.contains("insufficient") && (lower.contains("balance") || lower.contains("margin")) {
            return AppError::insufficient_funds(msg.clone());
        }
        if lower.contains("trading is not allowed") || lower.contains("market is closed") {
            return AppError::market_closed(msg.clone());
        }
    }
    classify_status(status)
}
