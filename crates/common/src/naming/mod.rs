mod memory;

pub use memory::MemoryNameResolver;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::content::ContentHash;

/// Default timeout for resolving a handle
pub const RESOLVE_TIMEOUT: Duration = Duration::from_secs(180);
/// Timeout budget for publishing a pointer update
pub const PUBLISH_TIMEOUT: Duration = Duration::from_secs(180);

/// A mutable naming handle
///
/// An identity backed by an asymmetric key pair; its pointer can be
/// republished to reference successive content hashes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Handle(String);

impl Handle {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Handle {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for Handle {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Errors surfaced by a naming service
#[derive(Debug, thiserror::Error)]
pub enum NamingError {
    #[error("handle did not resolve: {0}")]
    Unresolved(Handle),
    #[error("naming operation timed out after {0:?}")]
    Timeout(Duration),
    #[error("naming service error: {0}")]
    Provider(#[from] anyhow::Error),
}

/// Consumed interface to the naming service
#[async_trait]
pub trait NameResolver: Send + Sync + Clone + 'static {
    /// Create a new identity-backed mutable pointer for `label`
    ///
    /// May take noticeably longer than a content put: this generates an
    /// asymmetric key pair.
    async fn generate_handle(&self, label: &str) -> Result<Handle, NamingError>;

    /// Return an existing handle for `label`, if one was generated before
    async fn find_handle(&self, label: &str) -> Result<Option<Handle>, NamingError>;

    /// Point `handle` at `hash`
    ///
    /// Idempotent per `(handle, hash)` pair. With `allow_offline` the update
    /// is durable best-effort even when disconnected from the wider network.
    async fn publish(
        &self,
        handle: &Handle,
        hash: &ContentHash,
        allow_offline: bool,
    ) -> Result<(), NamingError>;

    /// Resolve `handle` to the content hash it currently points at
    ///
    /// Traverses redirection chains with unlimited depth, bounded by the
    /// wall-clock timeout.
    async fn resolve(&self, handle: &Handle, timeout: Duration) -> Result<ContentHash, NamingError>;
}
