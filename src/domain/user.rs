use crate::domain::mode::OperatingMode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Admin,
}

/// Per-user 2FA enrollment state. The TOTP secret never leaves this struct
/// in plaintext form outside of enrollment/verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwoFactorState {
    pub enabled: bool,
    pub totp_secret_base32: Option<String>,
}

impl Default for TwoFactorState {
    fn default() -> Self {
        Self { enabled: false, totp_secret_base32: None }
    }
}

/// A registered end user. Created on registration, never mutated except
/// password/2FA toggles (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    pub two_factor: TwoFactorState,
    /// Governs whether and how the Trade Router lets this user's automated
    /// orders reach an adapter (spec §4.6). Defaults to the conservative
    /// `LearningOnly` for new registrations.
    pub mode: OperatingMode,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        matches!(self.role, Role::Admin)
    }
}
