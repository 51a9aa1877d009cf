mod memory;

pub use memory::MemoryTestIndex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::content::ContentHash;
use crate::crypto::Secret;
use crate::naming::Handle;

/// Errors surfaced by the local index
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("a record already exists for handle: {0}")]
    DuplicateHandle(Handle),
    #[error("record not found: {0}")]
    NotFound(String),
    #[error("index error: {0}")]
    Provider(#[from] anyhow::Error),
}

/// Where a record stands in its lifecycle, as far as the index can tell
///
/// Draft (encrypted, not yet stored) never reaches the index, and staleness
/// is only detectable against the naming service, so the durable states are
/// these two.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordStatus {
    /// Content hash exists in the network, no handle yet
    Stored,
    /// A handle exists and has been published for this record
    Published,
}

/// One local index row per test
///
/// The index is purely an accelerator for pointer lookup: `content_hash` is
/// the last-known value and is never trusted over the naming service's
/// resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestRecord {
    /// Unique across all records once set, and permanently associated with
    /// this record's lineage of content hashes
    pub name_handle: Option<Handle>,
    pub content_hash: ContentHash,
    pub secret: Secret,
    pub is_owner: bool,
    pub is_active: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl TestRecord {
    pub fn status(&self) -> RecordStatus {
        match self.name_handle {
            Some(_) => RecordStatus::Published,
            None => RecordStatus::Stored,
        }
    }
}

/// A row about to be inserted
#[derive(Debug, Clone)]
pub struct NewTestRecord {
    pub name_handle: Option<Handle>,
    pub content_hash: ContentHash,
    pub secret: Secret,
    pub is_owner: bool,
}

impl NewTestRecord {
    /// A freshly created, owned record with no handle yet
    pub fn stored(content_hash: ContentHash, secret: Secret) -> Self {
        Self {
            name_handle: None,
            content_hash,
            secret,
            is_owner: true,
        }
    }

    /// A record imported from an externally-known handle
    pub fn imported(handle: Handle, content_hash: ContentHash, secret: Secret) -> Self {
        Self {
            name_handle: Some(handle),
            content_hash,
            secret,
            is_owner: false,
        }
    }
}

/// Consumed interface to the durable local index
///
/// Each call is assumed atomic; the collaborator serializes its own
/// concurrent access. The core only sequences these calls, it adds no
/// transactional semantics of its own.
#[async_trait]
pub trait TestIndex: Send + Sync + Clone + 'static {
    /// Append a new record; fails on a duplicate `name_handle`
    async fn insert(&self, record: NewTestRecord) -> Result<(), IndexError>;

    /// All records, ordered by `updated_at` descending
    async fn find_all(&self, active_only: bool) -> Result<Vec<TestRecord>, IndexError>;

    /// Look up a record by handle; absent or inactive rows are `NotFound`
    async fn find_by_handle(&self, handle: &Handle) -> Result<TestRecord, IndexError>;

    /// Advance the cached content hash for a handle, as one
    /// atomically-visible write
    async fn update_content_hash(
        &self,
        handle: &Handle,
        hash: &ContentHash,
    ) -> Result<(), IndexError>;

    /// Attach a freshly published handle to the record holding `hash`
    async fn mark_published(&self, hash: &ContentHash, handle: &Handle) -> Result<(), IndexError>;
}
