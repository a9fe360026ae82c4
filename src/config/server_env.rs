use anyhow::{Context, Result, bail};

#[derive(Debug, Clone)]
pub struct ServerEnvConfig {
    pub listen_addr: String,
    pub jwt_secret: String,
    pub observability_enabled: bool,
}

impl ServerEnvConfig {
    pub fn from_env() -> Result<Self> {
        let listen_addr = std::env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

        let jwt_secret = std::env::var("JWT_SECRET").context("JWT_SECRET is required")?;
        if jwt_secret.len() < 32 {
            bail!("JWT_SECRET must be at least 32 bytes, got {}", jwt_secret.len());
        }

        let observability_enabled = std::env::var("OBSERVABILITY_ENABLED")
            .map(|v| v != "false" && v != "0")
            .unwrap_or(true);

        Ok(Self { listen_addr, jwt_secret, observability_enabled })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_short_jwt_secrets() {
        let _guard = crate::config::test_support::env_lock().lock().unwrap();
        unsafe {
            std::env::set_var("JWT_SECRET", "too-short");
        }
        assert!(ServerEnvConfig::from_env().is_err());
        unsafe {
            std::env::remove_var("JWT_SECRET");
        }
    }

    #[test]
    fn accepts_a_sufficiently_long_secret() {
        let _guard = crate::config::test_support::env_lock().lock().unwrap();
        unsafe {
            std::env::set_var("JWT_SECRET", "a".repeat(32));
        }
        assert!(ServerEnvConfig::from_env().is_ok());
        unsafe {
            std::env::remove_var("JWT_SECRET");
        }
    }
}
