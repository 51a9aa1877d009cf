//! Secrets and purpose-scoped key derivation
//!
//! A `Secret` is the single caller-held value a test record is protected by.
//! It never leaves the local environment; everything else (the metadata and
//! artifact cipher keys) is derived from it deterministically, so sharing a
//! test means sharing exactly one string.

use hkdf::Hkdf;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use super::cipher::Cipher;

/// Number of random bytes behind a secret
pub const SECRET_SIZE: usize = 16;
/// Size of each derived subkey in bytes (128 bits)
pub const SUBKEY_SIZE: usize = 16;

/// Errors that can occur when handling secrets
#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    #[error("malformed secret: expected XXXXXXXX-XXXX-XXXX-XXXX-XXXXXXXXXXXX")]
    Malformed,
}

/// The caller-held secret a test record is encrypted under
///
/// Rendered as 16 random bytes in grouped uppercase hex
/// (`XXXXXXXX-XXXX-XXXX-XXXX-XXXXXXXXXXXX`). The secret itself is never
/// transmitted to the content network or the naming service; it exists only
/// to derive keys locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl std::fmt::Display for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Secret {
    /// Generate a new random secret using a cryptographically secure RNG
    ///
    /// An unavailable entropy source is fatal and non-retryable.
    pub fn generate() -> Self {
        let mut buff = [0u8; SECRET_SIZE];
        getrandom::getrandom(&mut buff).expect("failed to generate random bytes");
        Self(format!(
            "{}-{}-{}-{}-{}",
            hex::encode_upper(&buff[0..4]),
            hex::encode_upper(&buff[4..6]),
            hex::encode_upper(&buff[6..8]),
            hex::encode_upper(&buff[8..10]),
            hex::encode_upper(&buff[10..16]),
        ))
    }

    /// Parse a secret arriving over an API boundary, validating its shape
    pub fn parse(value: &str) -> Result<Self, SecretError> {
        let groups: Vec<&str> = value.split('-').collect();
        let lens = [8usize, 4, 4, 4, 12];
        if groups.len() != lens.len() {
            return Err(SecretError::Malformed);
        }
        for (group, len) in groups.iter().zip(lens) {
            if group.len() != len || !group.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(SecretError::Malformed);
            }
        }
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Derive the fixed set of purpose-scoped subkeys from this secret
    ///
    /// Runs HKDF-SHA256 over the secret bytes (no salt, no info) and reads
    /// three sequential 16-byte chunks. Deterministic: the same secret always
    /// yields a byte-identical key set.
    pub fn derive_keys(&self) -> DerivedKeys {
        let hkdf = Hkdf::<Sha256>::new(None, self.0.as_bytes());
        let mut okm = [0u8; SUBKEY_SIZE * 3];
        // 48 bytes is far below the HKDF-SHA256 output bound; running out of
        // expansion output here is an invariant violation, not an error.
        hkdf.expand(&[], &mut okm)
            .expect("hkdf expansion exhausted below its output bound");

        let mut metadata_key = [0u8; SUBKEY_SIZE];
        let mut artifact_key = [0u8; SUBKEY_SIZE];
        let mut reserved_key = [0u8; SUBKEY_SIZE];
        metadata_key.copy_from_slice(&okm[0..SUBKEY_SIZE]);
        artifact_key.copy_from_slice(&okm[SUBKEY_SIZE..SUBKEY_SIZE * 2]);
        reserved_key.copy_from_slice(&okm[SUBKEY_SIZE * 2..SUBKEY_SIZE * 3]);

        DerivedKeys {
            metadata_key,
            artifact_key,
            reserved_key,
        }
    }
}

/// The fixed set of subkeys derived from a secret
///
/// Each subkey is bound to one purpose by name. `reserved_key` is derived for
/// forward compatibility and currently has no consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedKeys {
    metadata_key: [u8; SUBKEY_SIZE],
    artifact_key: [u8; SUBKEY_SIZE],
    reserved_key: [u8; SUBKEY_SIZE],
}

impl DerivedKeys {
    /// The cipher for the metadata channel
    pub fn metadata_cipher(&self) -> Cipher {
        Cipher::from_subkey(&self.metadata_key)
    }

    /// The cipher for the artifact channel
    pub fn artifact_cipher(&self) -> Cipher {
        Cipher::from_subkey(&self.artifact_key)
    }

    /// The reserved subkey, unused for now
    pub fn reserved_key(&self) -> &[u8; SUBKEY_SIZE] {
        &self.reserved_key
    }
}
