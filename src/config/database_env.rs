use anyhow::Result;

#[derive(Debug, Clone)]
pub struct DatabaseEnvConfig {
    pub db_url: String,
}

impl DatabaseEnvConfig {
    pub fn from_env() -> Result<Self> {
        let db_url = std::env::var("DB_URL").unwrap_or_else(|_| "sqlite://./data/vaultrade.db".to_string());
        if !db_url.starts_with("sqlite://") {
            anyhow::bail!("DB_URL must be a sqlite:// connection string, got {db_url}");
        }
        Ok(Self { db_url })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_a_local_sqlite_file() {
        let _guard = crate::config::test_support::env_lock().lock().unwrap();
        unsafe {
            std::env::remove_var("DB_URL");
        }
        let config = DatabaseEnvConfig::from_env().unwrap();
        assert!(config.db_url.starts_with("sqlite://"));
    }
}
