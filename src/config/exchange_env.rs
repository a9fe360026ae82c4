//! Per-exchange base URLs for `ExchangeAdapterHandle::build` (spec §4.3).
//! One live and one sandbox URL per exchange kind; platforms created with
//! `is_sandbox = true` resolve against the sandbox URL.

use anyhow::Result;

#[derive(Debug, Clone)]
pub struct ExchangeEnvConfig {
    pub binance_base_url: String,
    pub binance_sandbox_base_url: String,
    pub bybit_base_url: String,
    pub bybit_sandbox_base_url: String,
    pub okx_base_url: String,
    pub okx_sandbox_base_url: String,
}

impl ExchangeEnvConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            binance_base_url: std::env::var("BINANCE_BASE_URL")
                .unwrap_or_else(|_| "https://api.binance.com".to_string()),
            binance_sandbox_base_url: std::env::var("BINANCE_SANDBOX_BASE_URL")
                .unwrap_or_else(|_| "https://testnet.binance.vision".to_string()),
            bybit_base_url: std::env::var("BYBIT_BASE_URL")
                .unwrap_or_else(|_| "https://api.bybit.com".to_string()),
            bybit_sandbox_base_url: std::env::var("BYBIT_SANDBOX_BASE_URL")
                .unwrap_or_else(|_| "https://api-testnet.bybit.com".to_string()),
            okx_base_url: std::env::var("OKX_BASE_URL").unwrap_or_else(|_| "https://www.okx.com".to_string()),
            okx_sandbox_base_url: std::env::var("OKX_SANDBOX_BASE_URL")
                .unwrap_or_else(|_| "https://www.okx.com".to_string()),
        })
    }

    /// Resolve the base URL for `kind`, honoring `is_sandbox` (OKX has no
    /// distinct sandbox host; it uses a demo-trading header instead, which
    /// is out of scope here — sandbox platforms still hit the live host).
    pub fn base_url_for(&self, kind: crate::domain::platform::PlatformKind, is_sandbox: bool) -> &str {
        use crate::domain::platform::PlatformKind;
        match (kind, is_sandbox) {
            (PlatformKind::Binance, true) => &self.binance_sandbox_base_url,
            (PlatformKind::Binance, false) => &self.binance_base_url,
            (PlatformKind::Bybit, true) => &self.bybit_sandbox_base_url,
            (PlatformKind::Bybit, false) => &self.bybit_base_url,
            (PlatformKind::Okx, true) => &self.okx_sandbox_base_url,
            (PlatformKind::Okx, false) => &self.okx_base_url,
            (PlatformKind::Paper, _) => "",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_populated() {
        let config = ExchangeEnvConfig::from_env().unwrap();
        assert!(config.binance_base_url.starts_with("https://"));
        assert!(config.bybit_sandbox_base_url.starts_with("https://"));
    }
}
