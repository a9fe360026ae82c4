//! Closed set of exchange connector variants (spec §4.3; Design Notes:
//! "Dynamic dispatch over exchange clients... express as a closed set of
//! variants" rather than `Box<dyn ExchangeAdapter>` chosen per-platform at
//! runtime from an open registry).

pub mod binance;
pub mod bybit;
pub mod okx;
pub mod paper;

use crate::domain::errors::AppError;
use crate::domain::order::TradeOrder;
use crate::domain::platform::{Platform, PlatformCredentials, PlatformKind};
use crate::domain::ports::{AdapterTestResult, AssetBalance, ExchangeAdapter, PlacedOrder, PlacedOrderStatus};
use crate::domain::quote::Quote;
use crate::infrastructure::market_data::MarketDataAggregator;
use async_trait::async_trait;
use binance::BinanceAdapter;
use bybit::BybitAdapter;
use okx::OkxAdapter;
use paper::PaperAdapter;
use std::collections::HashMap;
use std::sync::Arc;

pub enum ExchangeAdapterHandle {
    Binance(BinanceAdapter),
    Bybit(BybitAdapter),
    Okx(OkxAdapter),
    Paper(PaperAdapter),
}

impl ExchangeAdapterHandle {
    /// Build the adapter variant matching `platform.kind`, given its
    /// decrypted credentials (unused for `Paper`) and the shared Aggregator
    /// (used only by `Paper`).
    pub fn build(
        platform: &Platform,
        credentials: Option<&PlatformCredentials>,
        live_base_url: &str,
        aggregator: Arc<MarketDataAggregator>,
    ) -> Result<Self, AppError> {
        match platform.kind {
            PlatformKind::Binance => {
                let creds = credentials
                    .ok_or_else(|| AppError::internal("binance platform missing credentials"))?;
                Ok(Self::Binance(BinanceAdapter::new(live_base_url, creds)))
            }
            PlatformKind::Bybit => {
                let creds = credentials
                    .ok_or_else(|| AppError::internal("bybit platform missing credentials"))?;
                Ok(Self::Bybit(BybitAdapter::new(live_base_url, creds)))
            }
            PlatformKind::Okx => {
                let creds =
                    credentials.ok_or_else(|| AppError::internal("okx platform missing credentials"))?;
                Ok(Self::Okx(OkxAdapter::new(live_base_url, creds)?))
            }
            PlatformKind::Paper => Ok(Self::Paper(PaperAdapter::new(aggregator, HashMap::new()))),
        }
    }
}

#[async_trait]
impl ExchangeAdapter for ExchangeAdapterHandle {
    async fn test(&self) -> Result<AdapterTestResult, AppError> {
        match self {
            Self::Binance(a) => a.test().await,
            Self::Bybit(a) => a.test().await,
            Self::Okx(a) => a.test().await,
            Self::Paper(a) => a.test().await,
        }
    }

    async fn balances(&self) -> Result<HashMap<String, AssetBalance>, AppError> {
        match self {
            Self::Binance(a) => a.balances().await,
            Self::Bybit(a) => a.balances().await,
            Self::Okx(a) => a.balances().await,
            Self::Paper(a) => a.balances().await,
        }
    }

    async fn ticker(&self, symbol: &str) -> Result<Quote, AppError> {
        match self {
            Self::Binance(a) => a.ticker(symbol).await,
            Self::Bybit(a) => a.ticker(symbol).await,
            Self::Okx(a) => a.ticker(symbol).await,
            Self::Paper(a) => a.ticker(symbol).await,
        }
    }

    async fn place_order(&self, order: &TradeOrder) -> Result<PlacedOrder, AppError> {
        match self {
            Self::Binance(a) => a.place_order(order).await,
            Self::Bybit(a) => a.place_order(order).await,
            Self::Okx(a) => a.place_order(order).await,
            Self::Paper(a) => a.place_order(order).await,
        }
    }

    async fn cancel(&self, exchange_order_id: &str) -> Result<(), AppError> {
        match self {
            Self::Binance(a) => a.cancel(exchange_order_id).await,
            Self::Bybit(a) => a.cancel(exchange_order_id).await,
            Self::Okx(a) => a.cancel(exchange_order_id).await,
            Self::Paper(a) => a.cancel(exchange_order_id).await,
        }
    }

    async fn order_status(&self, exchange_order_id: &str) -> Result<PlacedOrderStatus, AppError> {
        match self {
            Self::Binance(a) => a.order_status(exchange_order_id).await,
            Self::Bybit(a) => a.order_status(exchange_order_id).await,
            Self::Okx(a) => a.order_status(exchange_order_id).await,
            Self::Paper(a) => a.order_status(exchange_order_id).await,
        }
    }
}
