//! Secret Vault (spec §4.1): symmetric encryption/decryption of exchange
//! credentials at rest, grounded on
//! `praveen686-shrivenQ/services/secrets-manager`'s AES-256-GCM usage.
//!
//! Ciphertext layout: `nonce(12 bytes) || aes_gcm_ciphertext_with_tag`.
//! Decryption failure is an `AppError::Vault` and is never caught and
//! converted to a default value — callers must propagate it.

use crate::domain::errors::AppError;
use crate::domain::platform::PlatformCredentials;
use crate::domain::ports::CredentialResolver;
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use rand::RngCore;
use serde::{Deserialize, Serialize};

const NONCE_LEN: usize = 12;

pub struct SecretVault {
    cipher: Aes256Gcm,
}

#[derive(Serialize, Deserialize)]
struct CredentialPayload {
    api_key: String,
    secret_key: String,
    passphrase: Option<String>,
}

impl SecretVault {
    /// Resolve the vault key from `VAULT_KEY` (base64, must decode to exactly
    /// 32 bytes). Missing or invalid key is a fatal startup error (spec
    /// §4.1) — callers should propagate the error up to `main` and exit 1.
    pub fn from_base64_key(encoded: &str) -> Result<Self, AppError> {
        let key_bytes = BASE64
            .decode(encoded.trim())
            .map_err(|e| AppError::Vault(format!("VAULT_KEY is not valid base64: {e}")))?;
        if key_bytes.len() != 32 {
            return Err(AppError::Vault(format!(
                "VAULT_KEY must decode to 32 bytes, got {}",
                key_bytes.len()
            )));
        }
        let key = Key::<Aes256Gcm>::from_slice(&key_bytes);
        Ok(Self { cipher: Aes256Gcm::new(key) })
    }

    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, AppError> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);
        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext)
            .map_err(|e| AppError::Vault(format!("encryption failed: {e}")))?;
        let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        out.extend_from_slice(&nonce_bytes);
        out.extend_from_slice(&ciphertext);
        Ok(out)
    }

    pub fn decrypt(&self, blob: &[u8]) -> Result<Vec<u8>, AppError> {
        if blob.len() < NONCE_LEN {
            return Err(AppError::Vault("ciphertext too short to contain a nonce".into()));
        }
        let (nonce_bytes, ciphertext) = blob.split_at(NONCE_LEN);
        let nonce = Nonce::from_slice(nonce_bytes);
        self.cipher
            .decrypt(nonce, ciphertext)
            .map_err(|_| AppError::Vault("decryption failed: authentication tag mismatch".into()))
    }
}

impl CredentialResolver for SecretVault {
    fn decrypt(&self, ciphertext: &[u8]) -> Result<PlatformCredentials, AppError> {
        let plaintext = self.decrypt(ciphertext)?;
        let payload: CredentialPayload = serde_json::from_slice(&plaintext)
            .map_err(|e| AppError::Vault(format!("corrupt credential payload: {e}")))?;
        Ok(PlatformCredentials {
            api_key: payload.api_key,
            secret_key: payload.secret_key,
            passphrase: payload.passphrase,
        })
    }

    fn encrypt(&self, credentials: &PlatformCredentials) -> Result<Vec<u8>, AppError> {
        let payload = CredentialPayload {
            api_key: credentials.api_key.clone(),
            secret_key: credentials.secret_key.clone(),
            passphrase: credentials.passphrase.clone(),
        };
        let plaintext = serde_json::to_vec(&payload)
            .map_err(|e| AppError::Vault(format!("failed to serialize credentials: {e}")))?;
        self.encrypt(&plaintext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_vault() -> SecretVault {
        let key = BASE64.encode([7u8; 32]);
        SecretVault::from_base64_key(&key).unwrap()
    }

    #[test]
    fn round_trips_plaintext() {
        let vault = test_vault();
        let ciphertext = vault.encrypt(b"super-secret-api-key").unwrap();
        let plaintext = vault.decrypt(&ciphertext).unwrap();
        assert_eq!(plaintext, b"super-secret-api-key");
    }

    #[test]
    fn rejects_tampered_ciphertext() {
        let vault = test_vault();
        let mut ciphertext = vault.encrypt(b"super-secret-api-key").unwrap();
        let last = ciphertext.len() - 1;
        ciphertext[last] ^= 0xFF;
        assert!(vault.decrypt(&ciphertext).is_err());
    }

    #[test]
    fn rejects_invalid_key_length() {
        let short_key = BASE64.encode([1u8; 16]);
        assert!(SecretVault::from_base64_key(&short_key).is_err());
    }

    #[test]
    fn rejects_non_base64_key() {
        assert!(SecretVault::from_base64_key("not base64!!!").is_err());
    }

    #[test]
    fn credential_resolver_round_trip() {
        let vault = test_vault();
        let creds = PlatformCredentials {
            api_key: "key".into(),
            secret_key: "secret".into(),
            passphrase: Some("pass".into()),
        };
        let ciphertext = CredentialResolver::encrypt(&vault, &creds).unwrap();
        let restored = CredentialResolver::decrypt(&vault, &ciphertext).unwrap();
        assert_eq!(restored.api_key, "key");
        assert_eq!(restored.secret_key, "secret");
        assert_eq!(restored.passphrase.as_deref(), Some("pass"));
    }
}
