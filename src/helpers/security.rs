use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Key, Nonce,
};
use base64::{engine::general_purpose, Engine as _};
use rand::{distributions::Alphanumeric, Rng};
use sha2::{Digest, Sha256};

const MIN_KEY_LENGTH: usize = 32;
const NONCE_LENGTH: usize = 12;
const SEPARATOR: char = ':';

#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("encryption key must be at least {MIN_KEY_LENGTH} characters")]
    KeyTooShort,
    #[error("failed to encrypt value: {0}")]
    Encrypt(String),
    #[error("failed to decrypt value: {0}")]
    Decrypt(String),
}

/// Symmetric sealing of secret fields (registry passwords, repo credentials).
///
/// Every encrypted value is self-contained: `base64(nonce):base64(ciphertext)`.
#[derive(Clone)]
pub struct Encryptor {
    cipher: Aes256Gcm,
}

impl std::fmt::Debug for Encryptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Encryptor { .. }")
    }
}

impl Encryptor {
    pub fn new(key: &str) -> Result<Self, CryptoError> {
        if key.chars().count() < MIN_KEY_LENGTH {
            return Err(CryptoError::KeyTooShort);
        }

        // 32-byte AES-256 key from the configured passphrase
        let derived = Sha256::digest(key.as_bytes());
        let key = Key::<Aes256Gcm>::from_slice(&derived);
        Ok(Self {
            cipher: Aes256Gcm::new(key),
        })
    }

    #[tracing::instrument(name = "Encryptor::encrypt", skip_all)]
    pub fn encrypt(&self, plaintext: &str) -> Result<String, CryptoError> {
        // 96-bits; unique per message
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let cipher_vec = self
            .cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|e| CryptoError::Encrypt(format!("{:?}", e)))?;

        Ok(format!(
            "{}{}{}",
            general_purpose::STANDARD.encode(nonce.as_slice()),
            SEPARATOR,
            general_purpose::STANDARD.encode(cipher_vec)
        ))
    }

    #[tracing::instrument(name = "Encryptor::decrypt", skip_all)]
    pub fn decrypt(&self, encrypted: &str) -> Result<String, CryptoError> {
        let (nonce_b64, data_b64) = encrypted
            .split_once(SEPARATOR)
            .ok_or_else(|| CryptoError::Decrypt("missing nonce separator".to_string()))?;

        let nonce_bytes = general_purpose::STANDARD
            .decode(nonce_b64)
            .map_err(|e| CryptoError::Decrypt(format!("b64 nonce: {}", e)))?;
        if nonce_bytes.len() != NONCE_LENGTH {
            return Err(CryptoError::Decrypt(format!(
                "nonce must be {} bytes, got {}",
                NONCE_LENGTH,
                nonce_bytes.len()
            )));
        }
        let data = general_purpose::STANDARD
            .decode(data_b64)
            .map_err(|e| CryptoError::Decrypt(format!("b64 data: {}", e)))?;

        let nonce = Nonce::from_slice(&nonce_bytes);
        let plaintext = self
            .cipher
            .decrypt(nonce, data.as_ref())
            .map_err(|e| CryptoError::Decrypt(format!("{:?}", e)))?;

        String::from_utf8(plaintext).map_err(|e| CryptoError::Decrypt(format!("{:?}", e)))
    }
}

/// Random alphanumeric token for webhooks and deploy tokens.
pub fn generate_token(length: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "0123456789abcdef0123456789abcdef";

    #[test]
    fn test_round_trip() {
        let encryptor = Encryptor::new(KEY).unwrap();
        for value in ["", "hunter2", "pässwörd with unicode ✓", "a:b:c"] {
            let sealed = encryptor.encrypt(value).unwrap();
            assert_eq!(encryptor.decrypt(&sealed).unwrap(), value);
        }
    }

    #[test]
    fn test_random_nonce_per_call() {
        let encryptor = Encryptor::new(KEY).unwrap();
        let first = encryptor.encrypt("same").unwrap();
        let second = encryptor.encrypt("same").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_short_key_is_rejected() {
        let err = Encryptor::new("too-short").unwrap_err();
        assert!(matches!(err, CryptoError::KeyTooShort));
    }

    #[test]
    fn test_other_key_cannot_decrypt() {
        let sealed = Encryptor::new(KEY).unwrap().encrypt("secret").unwrap();
        let other = Encryptor::new("fedcba9876543210fedcba9876543210").unwrap();
        assert!(other.decrypt(&sealed).is_err());
    }

    #[test]
    fn test_malformed_input() {
        let encryptor = Encryptor::new(KEY).unwrap();
        assert!(encryptor.decrypt("no-separator").is_err());
        assert!(encryptor.decrypt("AAAA:BBBB").is_err());
    }

    #[test]
    fn test_generate_token() {
        let token = generate_token(40);
        assert_eq!(token.len(), 40);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(token, generate_token(40));
    }
}
