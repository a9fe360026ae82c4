//! OKX `ExchangeAdapter`. Same trait surface as `binance.rs`/`bybit.rs`,
//! signing scheme adapted to OKX's documented v5 auth: HMAC-SHA256 base64
//! over `timestamp + method + request_path + body`, plus the account
//! passphrase as a separate header (`OK-ACCESS-PASSPHRASE`) — the one
//! adapter in this set whose `PlatformCredentials::passphrase` is required
//! rather than optional.

use crate::domain::errors::AppError;
use crate::domain::order::{OrderSide, OrderType, TradeOrder};
use crate::domain::platform::PlatformCredentials;
use crate::domain::ports::{AdapterTestResult, AssetBalance, ExchangeAdapter, PlacedOrder, PlacedOrderStatus};
use crate::domain::quote::{AssetClass, Quote};
use crate::infrastructure::http_client_factory::HttpClientFactory;
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, Mac};
use reqwest_middleware::ClientWithMiddleware;
use rust_decimal::Decimal;
use serde::Deserialize;
use sha2::Sha256;
use std::collections::HashMap;
use std::time::{Duration, Instant};

type HmacSha256 = Hmac<Sha256>;

pub struct OkxAdapter {
    client: ClientWithMiddleware,
    api_key: String,
    api_secret: String,
    passphrase: String,
    base_url: String,
}

impl OkxAdapter {
    pub fn new(base_url: impl Into<String>, credentials: &PlatformCredentials) -> Result<Self, AppError> {
        let passphrase = credentials
            .passphrase
            .clone()
            .ok_or_else(|| AppError::validation("okx platforms require a passphrase"))?;
        Ok(Self {
            client: HttpClientFactory::with_timeout(Duration::from_secs(10)),
            api_key: credentials.api_key.clone(),
            api_secret: credentials.secret_key.clone(),
            passphrase,
            base_url: base_url.into(),
        })
    }

    fn sign(&self, timestamp: &str, method: &str, path: &str, body: &str) -> String {
        let prehash = format!("{timestamp}{method}{path}{body}");
        let mut mac = HmacSha256::new_from_slice(self.api_secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(prehash.as_bytes());
        BASE64.encode(mac.finalize().into_bytes())
    }

    fn auth_headers(&self, method: &str, path: &str, body: &str) -> Vec<(&'static str, String)> {
        let timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);
        let signature = self.sign(&timestamp, method, path, body);
        vec![
            ("OK-ACCESS-KEY", self.api_key.clone()),
            ("OK-ACCESS-SIGN", signature),
            ("OK-ACCESS-TIMESTAMP", timestamp),
            ("OK-ACCESS-PASSPHRASE", self.passphrase.clone()),
        ]
    }
}

#[async_trait]
impl ExchangeAdapter for OkxAdapter {
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
        let path = "/api/v5/account/balance";
        let url = format!("{}{}", self.base_url, path);

        let mut request = self.client.get(&url);
        for (name, value) in self.auth_headers("GET", path, "") {
            request = request.header(name, value);
        }
        let response = request
            .send()
            .await
            .map_err(|e| AppError::upstream(format!("okx balance fetch failed: {e}"), true))?;

        if !response.status().is_success() {
            return Err(classify_error_response(response).await);
        }

        #[derive(Debug, Deserialize)]
        struct Detail {
            ccy: String,
            #[serde(rename = "availBal")]
            avail_bal: String,
            #[serde(rename = "frozenBal")]
            frozen_bal: String,
        }
        #[derive(Debug, Deserialize)]
        struct DataEntry {
            details: Vec<Detail>,
        }
        #[derive(Debug, Deserialize)]
        struct BalanceResponse {
            data: Vec<DataEntry>,
        }

        let parsed: BalanceResponse = response
            .json()
            .await
            .map_err(|e| AppError::upstream(format!("okx balance parse failure: {e}"), false))?;

        Ok(parsed
            .data
            .into_iter()
            .flat_map(|entry| entry.details)
            .map(|d| {
                (
                    d.ccy,
                    AssetBalance {
                        free: d.avail_bal.parse().unwrap_or(Decimal::ZERO),
                        locked: d.frozen_bal.parse().unwrap_or(Decimal::ZERO),
                    },
                )
            })
            .filter(|(_, bal)| bal.free + bal.locked > Decimal::ZERO)
            .collect())
    }

    async fn ticker(&self, symbol: &str) -> Result<Quote, AppError> {
        let url = format!("{}/api/v5/market/ticker?instId={}", self.base_url, symbol);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::upstream(format!("okx ticker fetch failed: {e}"), true))?;

        if !response.status().is_success() {
            return Err(classify_error_response(response).await);
        }

        #[derive(Debug, Deserialize)]
        struct TickerEntry {
            last: String,
        }
        #[derive(Debug, Deserialize)]
        struct TickerResponse {
            data: Vec<TickerEntry>,
        }

        let parsed: TickerResponse = response
            .json()
            .await
            .map_err(|e| AppError::upstream(format!("okx ticker parse failure: {e}"), false))?;
        let entry = parsed.data.first().ok_or_else(|| AppError::upstream("okx returned no ticker data", true))?;
        let price = entry
            .last
            .parse::<Decimal>()
            .map_err(|_| AppError::upstream("okx returned a non-numeric price", false))?;

        Ok(Quote {
            symbol: symbol.to_string(),
            price,
            change_24h_pct: Decimal::ZERO,
            volume_24h: Decimal::ZERO,
            high_24h: price,
            low_24h: price,
            asset_class: AssetClass::Crypto,
            source_tag: "adapter:okx".to_string(),
            fetched_at: chrono::Utc::now(),
            fetched_monotonic: Some(Instant::now()),
        })
    }

    async fn place_order(&self, order: &TradeOrder) -> Result<PlacedOrder, AppError> {
        let side = match order.side {
            OrderSide::Buy => "buy",
            OrderSide::Sell => "sell",
        };
        let order_type = match order.order_type {
            OrderType::Market => "market",
            OrderType::Limit => "limit",
            OrderType::StopLoss | OrderType::TakeProfit => "market",
        };

        let body = serde_json::json!({
            "instId": order.symbol,
            "tdMode": "cash",
            "side": side,
            "ordType": order_type,
            "sz": order.quantity.to_string(),
            "px": order.limit_price.map(|p| p.to_string()),
        })
        .to_string();

        let path = "/api/v5/trade/order";
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.client.post(&url).body(body.clone());
        for (name, value) in self.auth_headers("POST", path, &body) {
            request = request.header(name, value);
        }
        let response = request
            .send()
            .await
            .map_err(|e| AppError::upstream(format!("okx order placement failed: {e}"), true))?;

        if !response.status().is_success() {
            return Err(classify_error_response(response).await);
        }

        #[derive(Debug, Deserialize)]
        struct OrderData {
            #[serde(rename = "ordId")]
            ord_id: String,
            #[serde(rename = "sCode")]
            s_code: String,
        }
        #[derive(Debug, Deserialize)]
        struct OrderResponse {
            data: Vec<OrderData>,
        }
        let parsed: OrderResponse = response
            .json()
            .await
            .map_err(|e| AppError::upstream(format!("okx order response parse failure: {e}"), false))?;
        let entry = parsed
            .data
            .into_iter()
            .next()
            .ok_or_else(|| AppError::upstream("okx returned an empty order response", false))?;

        Ok(PlacedOrder {
            exchange_order_id: entry.ord_id,
            fill_price: None,
            status: if entry.s_code == "0" { PlacedOrderStatus::Accepted } else { PlacedOrderStatus::Rejected },
        })
    }

    async fn cancel(&self, exchange_order_id: &str) -> Result<(), AppError> {
        let body = serde_json::json!({ "ordId": exchange_order_id }).to_string();
        let path = "/api/v5/trade/cancel-order";
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.client.post(&url).body(body.clone());
        for (name, value) in self.auth_headers("POST", path, &body) {
            request = request.header(name, value);
        }
        let response = request
            .send()
            .await
            .map_err(|e| AppError::upstream(format!("okx cancel failed: {e}"), true))?;

        if !response.status().is_success() {
            return Err(classify_error_response(response).await);
        }
        Ok(())
    }

    async fn order_status(&self, exchange_order_id: &str) -> Result<PlacedOrderStatus, AppError> {
        let path = format!("/api/v5/trade/order?ordId={exchange_order_id}");
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.client.get(&url);
        for (name, value) in self.auth_headers("GET", &path, "") {
            request = request.header(name, value);
        }
        let response = request
            .send()
            .await
            .map_err(|e| AppError::upstream(format!("okx order status fetch failed: {e}"), true))?;

        if !response.status().is_success() {
            return Err(classify_error_response(response).await);
        }

        #[derive(Debug, Deserialize)]
        struct OrderData {
            state: String,
        }
        #[derive(Debug, Deserialize)]
        struct StatusResponse {
            data: Vec<OrderData>,
        }
        let parsed: StatusResponse = response
            .json()
            .await
            .map_err(|e| AppError::upstream(format!("okx order status parse failure: {e}"), false))?;

        Ok(match parsed.data.first().map(|d| d.state.as_str()) {
            Some("filled") => PlacedOrderStatus::Filled,
            Some("partially_filled") => PlacedOrderStatus::PartiallyFilled,
            Some("live") => PlacedOrderStatus::Accepted,
            _ => PlacedOrderStatus::Rejected,
        })
    }
}

fn classify_status(status: reqwest::StatusCode) -> AppError {
    match status.as_u16() {
        401 | 403 => AppError::auth("okx rejected the supplied API credentials"),
        429 => AppError::upstream("okx rate limit exceeded", true),
        400..=499 => AppError::upstream(format!("okx rejected the request: {status}"), false),
        _ => AppError::upstream(format!("okx returned {status}"), true),
    }
}

#[derive(Debug, Deserialize)]
struct OkxErrorBody {
    #[serde(rename = "msg")]
    msg: Option<String>,
}

/// Classifies a non-2xx response by OKX's `{code, msg}` body before falling
/// back to `classify_status`, mirroring `binance.rs`'s
/// `classify_error_response` so a user-caused rejection doesn't trip the
/// shared exchange circuit breakers the way a real outage does.
async fn classify_error_response(response: reqwest::Response) -> AppError {
    let status = response.status();
    match response.json::<OkxErrorBody>().await {
        Ok(body) => classify_error_body(status, body.msg),
        Err(_) => classify_status(status),
    }
}

fn classify_error_body(status: reqwest::StatusCode, msg: Option<String>) -> AppError {
    if let Some(msg) = &msg {
        let lower = msg.to_lowercase();
        if lower.contains("insufficient") && (lower.contains("balance") || lower.contains("funds") || lower.contains("equity")) {
            return AppError::insufficient_funds(msg.clone());
        }
        if lower.contains("market is closed") || lower.contains("instrument is not live") {
            return AppError::market_closed(msg.clone());
        }
    }
    classify_status(status)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> PlatformCredentials {
        PlatformCredentials { api_key: "k".into(), secret_key: "s".into(), passphrase: Some("p".into()) }
    }

    #[test]
    fn requires_a_passphrase() {
        let bare = PlatformCredentials { api_key: "k".into(), secret_key: "s".into(), passphrase: None };
        assert!(OkxAdapter::new("https://www.okx.com", &bare).is_err());
    }

    #[test]
    fn signature_is_base64() {
        let adapter = OkxAdapter::new("https://www.okx.com", &credentials()).unwrap();
        let signature = adapter.sign("2024-01-01T00:00:00.000Z", "GET", "/api/v5/account/balance", "");
        assert!(BASE64.decode(&signature).is_ok());
    }

    #[test]
    fn classifies_insufficient_balance_message_as_insufficient_funds() {
        let err = classify_error_body(reqwest::StatusCode::BAD_REQUEST, Some("Insufficient balance".to_string()));
        assert!(matches!(err, AppError::InsufficientFunds { .. }));
        assert!(!err.counts_toward_breaker());
    }

    #[test]
    fn classifies_market_closed_message() {
        let err = classify_error_body(reqwest::StatusCode::BAD_REQUEST, Some("Market is closed".to_string()));
        assert!(matches!(err, AppError::MarketClosed { .. }));
        assert!(!err.counts_toward_breaker());
    }

    #[test]
    fn unrecognized_message_falls_back_to_status_classification() {
        let err = classify_error_body(reqwest::StatusCode::TOO_MANY_REQUESTS, Some("rate limited".to_string()));
        assert!(matches!(err, AppError::Upstream { .. }));
    }
}
