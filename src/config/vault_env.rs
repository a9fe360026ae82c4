use anyhow::{Context, Result, bail};

/// `VAULT_KEY` must be present and base64 (spec §4.1/§6). The key itself is
/// not decoded here — `SecretVault::from_base64_key` owns that — this
/// struct only guarantees the env var was set to something non-empty, so
/// the fatal-startup-error path is reached from `Config::from_env` rather
/// than deep inside vault construction.
#[derive(Debug, Clone)]
pub struct VaultEnvConfig {
    pub vault_key_base64: String,
}

impl VaultEnvConfig {
    pub fn from_env() -> Result<Self> {
        let vault_key_base64 = std::env::var("VAULT_KEY").context("VAULT_KEY is required")?;
        if vault_key_base64.trim().is_empty() {
            bail!("VAULT_KEY must not be empty");
        }
        Ok(Self { vault_key_base64 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_key() {
        let _guard = crate::config::test_support::env_lock().lock().unwrap();
        unsafe {
            std::env::set_var("VAULT_KEY", "");
        }
        assert!(VaultEnvConfig::from_env().is_err());
        unsafe {
            std::env::remove_var("VAULT_KEY");
        }
    }
}
