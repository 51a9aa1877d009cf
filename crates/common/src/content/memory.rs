use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use cid::Cid;
use multihash::Multihash;
use sha2::{Digest, Sha256};

use super::{ContentError, ContentHash, ContentStore};

/// Multihash code for SHA2-256
const SHA2_256: u64 = 0x12;

/// In-memory content store using HashMaps
///
/// Hashes blobs with SHA2-256 and renders a CIDv0 (base58) identifier, so
/// hashes look and behave like the real network's. Used as the reference
/// implementation in tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryContentStore {
    inner: Arc<RwLock<MemoryContentStoreInner>>,
}

#[derive(Debug, Default)]
struct MemoryContentStoreInner {
    blobs: HashMap<ContentHash, Bytes>,
    pinned: HashSet<ContentHash>,
}

impl MemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a blob was stored with the pin flag
    pub fn is_pinned(&self, hash: &ContentHash) -> bool {
        self.inner
            .read()
            .expect("content store lock poisoned")
            .pinned
            .contains(hash)
    }

    fn hash_bytes(bytes: &[u8]) -> ContentHash {
        let digest = Sha256::digest(bytes);
        let multihash =
            Multihash::<64>::wrap(SHA2_256, &digest).expect("sha2-256 digest fits a multihash");
        let cid = Cid::new_v0(multihash).expect("sha2-256 multihash is a valid CIDv0");
        ContentHash::from(cid.to_string())
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn put(&self, bytes: Bytes, pin: bool) -> Result<ContentHash, ContentError> {
        let hash = Self::hash_bytes(&bytes);
        let mut inner = self
            .inner
            .write()
            .map_err(|e| anyhow::anyhow!("failed to acquire write lock: {}", e))?;
        inner.blobs.insert(hash.clone(), bytes);
        if pin {
            inner.pinned.insert(hash.clone());
        }
        Ok(hash)
    }

    async fn get(&self, hash: &ContentHash, _timeout: Duration) -> Result<Bytes, ContentError> {
        let inner = self
            .inner
            .read()
            .map_err(|e| anyhow::anyhow!("failed to acquire read lock: {}", e))?;
        inner
            .blobs
            .get(hash)
            .cloned()
            .ok_or_else(|| ContentError::NotFound(hash.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get_roundtrip() {
        let store = MemoryContentStore::new();
        let bytes = Bytes::from_static(b"immutable blob");

        let hash = store.put(bytes.clone(), true).await.unwrap();
        let fetched = store.get(&hash, Duration::from_secs(1)).await.unwrap();

        assert_eq!(bytes, fetched);
        assert!(store.is_pinned(&hash));
    }

    #[tokio::test]
    async fn test_content_addressed() {
        let store = MemoryContentStore::new();
        let a = store.put(Bytes::from_static(b"same"), false).await.unwrap();
        let b = store.put(Bytes::from_static(b"same"), false).await.unwrap();
        let c = store
            .put(Bytes::from_static(b"different"), false)
            .await
            .unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
        // CIDv0 identifiers are base58 and start with Qm
        assert!(a.as_str().starts_with("Qm"));
    }

    #[tokio::test]
    async fn test_missing_hash() {
        let store = MemoryContentStore::new();
        let result = store
            .get(&ContentHash::from("QmMissing"), Duration::from_secs(1))
            .await;
        assert!(matches!(result, Err(ContentError::NotFound(_))));
    }
}
