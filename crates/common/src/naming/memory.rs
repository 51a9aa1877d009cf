use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use cid::multibase::Base;
use cid::Cid;
use ed25519_dalek::SigningKey;
use multihash::Multihash;

use crate::content::ContentHash;

use super::{Handle, NameResolver, NamingError};

/// Multicodec for libp2p public keys
const LIBP2P_KEY: u64 = 0x72;
/// Multihash code for the identity hash
const IDENTITY: u64 = 0x00;

/// In-memory naming service using HashMaps
///
/// Every generated handle is backed by a real Ed25519 key pair and rendered
/// as a base36 CIDv1 over the public key, the way the real network renders
/// its identity handles. Used as the reference implementation in tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryNameResolver {
    inner: Arc<RwLock<MemoryNameResolverInner>>,
}

#[derive(Debug, Default)]
struct MemoryNameResolverInner {
    /// label -> handle, for key reuse
    labels: HashMap<String, Handle>,
    /// generated keys by handle
    keys: HashMap<Handle, SigningKey>,
    /// the mutable pointers: handle -> current content hash
    pointers: HashMap<Handle, ContentHash>,
}

impl MemoryNameResolver {
    pub fn new() -> Self {
        Self::default()
    }

    fn handle_for_key(key: &SigningKey) -> Handle {
        let public = key.verifying_key();
        let multihash = Multihash::<64>::wrap(IDENTITY, public.as_bytes())
            .expect("32 byte key fits an identity multihash");
        let cid = Cid::new_v1(LIBP2P_KEY, multihash);
        Handle::from(cid.to_string_of_base(Base::Base36Lower).expect("base36 encoding"))
    }
}

#[async_trait]
impl NameResolver for MemoryNameResolver {
    async fn generate_handle(&self, label: &str) -> Result<Handle, NamingError> {
        let mut seed = [0u8; 32];
        getrandom::getrandom(&mut seed)
            .map_err(|e| anyhow::anyhow!("failed to generate key seed: {}", e))?;
        let key = SigningKey::from_bytes(&seed);
        let handle = Self::handle_for_key(&key);

        let mut inner = self
            .inner
            .write()
            .map_err(|e| anyhow::anyhow!("failed to acquire write lock: {}", e))?;
        if inner.labels.contains_key(label) {
            return Err(NamingError::Provider(anyhow::anyhow!(
                "key already exists for label: {}",
                label
            )));
        }
        inner.labels.insert(label.to_string(), handle.clone());
        inner.keys.insert(handle.clone(), key);

        Ok(handle)
    }

    async fn find_handle(&self, label: &str) -> Result<Option<Handle>, NamingError> {
        let inner = self
            .inner
            .read()
            .map_err(|e| anyhow::anyhow!("failed to acquire read lock: {}", e))?;
        Ok(inner.labels.get(label).cloned())
    }

    async fn publish(
        &self,
        handle: &Handle,
        hash: &ContentHash,
        _allow_offline: bool,
    ) -> Result<(), NamingError> {
        let mut inner = self
            .inner
            .write()
            .map_err(|e| anyhow::anyhow!("failed to acquire write lock: {}", e))?;
        if !inner.keys.contains_key(handle) {
            return Err(NamingError::Unresolved(handle.clone()));
        }
        inner.pointers.insert(handle.clone(), hash.clone());
        Ok(())
    }

    async fn resolve(
        &self,
        handle: &Handle,
        _timeout: Duration,
    ) -> Result<ContentHash, NamingError> {
        let inner = self
            .inner
            .read()
            .map_err(|e| anyhow::anyhow!("failed to acquire read lock: {}", e))?;
        inner
            .pointers
            .get(handle)
            .cloned()
            .ok_or_else(|| NamingError::Unresolved(handle.clone()))
    }
}
