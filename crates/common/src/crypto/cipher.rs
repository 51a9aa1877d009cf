//! Channel-bound AEAD encryption using ChaCha20-Poly1305
//!
//! A `Cipher` is obtained from a `DerivedKeys` accessor, never from raw key
//! bytes, so every encrypted blob is bound to exactly one purpose channel
//! (metadata or artifact). The encrypted format is:
//! `nonce (12 bytes) || ciphertext || auth tag (16 bytes)`.

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Key, Nonce,
};
use sha2::{Digest, Sha256};

use super::secret::SUBKEY_SIZE;

/// Size of the ChaCha20-Poly1305 nonce in bytes
pub const NONCE_SIZE: usize = 12;
/// Size of the ChaCha20-Poly1305 key in bytes (256 bits)
pub const KEY_SIZE: usize = 32;

/// Errors that can occur during encryption/decryption
///
/// None of these are transient: an authentication failure means the wrong
/// secret, tampering, or corruption, and must never be retried.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("data too short for nonce")]
    TooShort,
    #[error("authentication failed: wrong key or corrupted data")]
    Authentication,
    #[error("crypto error: {0}")]
    Default(#[from] anyhow::Error),
}

/// A purpose-bound symmetric codec
///
/// The 256-bit cipher key is the SHA-256 digest of the 128-bit derived
/// subkey, so the subkeys themselves never touch the AEAD directly.
#[derive(Clone)]
pub struct Cipher([u8; KEY_SIZE]);

impl Cipher {
    pub(super) fn from_subkey(subkey: &[u8; SUBKEY_SIZE]) -> Self {
        let digest = Sha256::digest(subkey);
        let mut key = [0u8; KEY_SIZE];
        key.copy_from_slice(&digest);
        Self(key)
    }

    /// Encrypt data on this channel
    ///
    /// A fresh random 96-bit nonce is generated per call and prepended to the
    /// output. Associated data is empty.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let key = Key::from_slice(&self.0);
        let cipher = ChaCha20Poly1305::new(key);

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        getrandom::getrandom(&mut nonce_bytes)
            .map_err(|e| anyhow::anyhow!("failed to generate nonce: {}", e))?;
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, plaintext)
            .map_err(|_| anyhow::anyhow!("encrypt error"))?;

        let mut out = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        out.extend_from_slice(nonce.as_ref());
        out.extend_from_slice(ciphertext.as_ref());

        Ok(out)
    }

    /// Decrypt data on this channel
    ///
    /// Expects `nonce (12 bytes) || ciphertext || tag (16 bytes)`.
    ///
    /// # Errors
    ///
    /// - `CryptoError::TooShort` when the input cannot hold a nonce
    /// - `CryptoError::Authentication` when the tag does not verify
    pub fn decrypt(&self, data: &[u8]) -> Result<Vec<u8>, CryptoError> {
        if data.len() < NONCE_SIZE {
            return Err(CryptoError::TooShort);
        }

        let key = Key::from_slice(&self.0);
        let nonce = Nonce::from_slice(&data[..NONCE_SIZE]);
        let cipher = ChaCha20Poly1305::new(key);

        cipher
            .decrypt(nonce, &data[NONCE_SIZE..])
            .map_err(|_| CryptoError::Authentication)
    }
}

impl std::fmt::Debug for Cipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // never print key material
        f.write_str("Cipher(..)")
    }
}
