use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlatformKind {
    Binance,
    Bybit,
    Okx,
    Paper,
}

impl PlatformKind {
    pub fn is_live(&self) -> bool {
        !matches!(self, PlatformKind::Paper)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlatformStatus {
    Disconnected,
    Connecting,
    Connected,
    Error,
}

/// An exchange connection belonging to a user. Credentials decrypt only
/// inside an `ExchangeAdapter` instance (spec invariant 3) — `ciphertext` is
/// the only form stored, and this struct never exposes a plaintext accessor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Platform {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub kind: PlatformKind,
    pub is_sandbox: bool,
    pub is_default: bool,
    pub ciphertext: Vec<u8>,
    pub status: PlatformStatus,
    pub last_tested_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Decrypted credential bundle. Lives only as a local value inside adapter
/// construction; never `Serialize`, never persisted, never logged.
#[derive(Debug, Clone)]
pub struct PlatformCredentials {
    pub api_key: String,
    pub secret_key: String,
    pub passphrase: Option<String>,
}
