mod memory;

pub use memory::MemoryContentStore;

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Default timeout for content fetches
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(60);

/// A deterministic, content-addressed identifier for an immutable blob
///
/// Printable and self-describing; identical bytes always yield the same hash.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentHash(String);

impl ContentHash {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ContentHash {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ContentHash {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Errors surfaced by a content store
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("content not found: {0}")]
    NotFound(ContentHash),
    #[error("content fetch timed out after {0:?}")]
    Timeout(Duration),
    #[error("content store error: {0}")]
    Provider(#[from] anyhow::Error),
}

/// Consumed interface to the content-addressed storage network
///
/// The core assumes each call is atomic; it serializes its own access and
/// adds no transactional semantics on top.
#[async_trait]
pub trait ContentStore: Send + Sync + Clone + 'static {
    /// Store an immutable blob, returning its content hash
    ///
    /// Content-addressed: identical bytes always yield the same hash.
    /// `pin = true` guarantees survival under local garbage collection.
    async fn put(&self, bytes: Bytes, pin: bool) -> Result<ContentHash, ContentError>;

    /// Fetch an immutable blob by hash
    ///
    /// Fails with `ContentError::NotFound` or `ContentError::Timeout` when
    /// the hash cannot be resolved within the timeout.
    async fn get(&self, hash: &ContentHash, timeout: Duration) -> Result<Bytes, ContentError>;
}
