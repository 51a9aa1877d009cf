mod cipher;
mod secret;

pub use cipher::{Cipher, CryptoError, NONCE_SIZE};
pub use secret::{DerivedKeys, Secret, SecretError, SUBKEY_SIZE};
