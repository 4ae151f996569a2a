// brewbot-core/src/crypto/mod.rs

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Key, Nonce,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use rand::rngs::OsRng;
use rand_core::TryRngCore;
use std::sync::Arc;

use crate::Error;

/// AES-256-GCM encryptor for credential records at rest. Output format is
/// base64(`nonce || ciphertext`) with a fresh 12-byte nonce per call.
#[derive(Clone)]
pub struct Encryptor {
    cipher: Arc<Aes256Gcm>,
}

impl Encryptor {
    /// Requires a 32-byte key.
    pub fn new(key_bytes: &[u8]) -> Result<Self, Error> {
        if key_bytes.len() != 32 {
            return Err(Error::KeyDerivation(format!(
                "AES-256 key must be 32 bytes, got {}",
                key_bytes.len()
            )));
        }
        let key = Key::<Aes256Gcm>::clone_from_slice(key_bytes);
        let cipher = Aes256Gcm::new(&key);

        Ok(Self {
            cipher: Arc::new(cipher),
        })
    }

    /// Builds an encryptor from a base64-encoded 32-byte key, the form the
    /// key takes in configuration.
    pub fn from_base64_key(encoded: &str) -> Result<Self, Error> {
        let key_bytes = BASE64
            .decode(encoded.trim())
            .map_err(|e| Error::KeyDerivation(format!("encryption key is not valid base64: {e}")))?;
        Self::new(&key_bytes)
    }

    pub fn encrypt(&self, data: &str) -> Result<String, Error> {
        let mut nonce_bytes = [0u8; 12];
        let mut rng = OsRng;
        rng.try_fill_bytes(&mut nonce_bytes)
            .map_err(|e| Error::Encryption(e.to_string()))?;

        let nonce = Nonce::from_slice(&nonce_bytes);
        let ciphertext = self
            .cipher
            .encrypt(nonce, data.as_bytes())
            .map_err(|e| Error::Encryption(e.to_string()))?;

        let mut combined = nonce_bytes.to_vec();
        combined.extend(ciphertext);
        Ok(BASE64.encode(combined))
    }

    pub fn decrypt(&self, encrypted_data: &str) -> Result<String, Error> {
        let data = BASE64
            .decode(encrypted_data)
            .map_err(|e| Error::Decryption(e.to_string()))?;

        // First 12 bytes are the nonce.
        if data.len() < 12 {
            return Err(Error::Decryption(
                "ciphertext too short (missing nonce)".to_owned(),
            ));
        }
        let (nonce_bytes, ciphertext) = data.split_at(12);
        let nonce = Nonce::from_slice(nonce_bytes);

        let plaintext = self
            .cipher
            .decrypt(nonce, ciphertext)
            .map_err(|e| Error::Decryption(e.to_string()))?;

        String::from_utf8(plaintext).map_err(|e| Error::Decryption(e.to_string()))
    }
}
