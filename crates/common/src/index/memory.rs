use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::content::ContentHash;
use crate::naming::Handle;

use super::{IndexError, NewTestRecord, TestIndex, TestRecord};

/// In-memory test index
///
/// Reference implementation of the index contract, used in tests in place of
/// the SQLite-backed index.
#[derive(Debug, Clone, Default)]
pub struct MemoryTestIndex {
    inner: Arc<RwLock<Vec<TestRecord>>>,
}

impl MemoryTestIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip a record inactive; read paths stop returning it
    pub fn deactivate(&self, handle: &Handle) -> Result<(), IndexError> {
        let mut rows = self
            .inner
            .write()
            .map_err(|e| anyhow::anyhow!("failed to acquire write lock: {}", e))?;
        let row = rows
            .iter_mut()
            .find(|r| r.name_handle.as_ref() == Some(handle))
            .ok_or_else(|| IndexError::NotFound(handle.to_string()))?;
        row.is_active = false;
        row.updated_at = OffsetDateTime::now_utc();
        Ok(())
    }
}

#[async_trait]
impl TestIndex for MemoryTestIndex {
    async fn insert(&self, record: NewTestRecord) -> Result<(), IndexError> {
        let mut rows = self
            .inner
            .write()
            .map_err(|e| anyhow::anyhow!("failed to acquire write lock: {}", e))?;

        if let Some(handle) = &record.name_handle {
            if rows.iter().any(|r| r.name_handle.as_ref() == Some(handle)) {
                return Err(IndexError::DuplicateHandle(handle.clone()));
            }
        }

        let now = OffsetDateTime::now_utc();
        rows.push(TestRecord {
            name_handle: record.name_handle,
            content_hash: record.content_hash,
            secret: record.secret,
            is_owner: record.is_owner,
            is_active: true,
            created_at: now,
            updated_at: now,
        });

        Ok(())
    }

    async fn find_all(&self, active_only: bool) -> Result<Vec<TestRecord>, IndexError> {
        let rows = self
            .inner
            .read()
            .map_err(|e| anyhow::anyhow!("failed to acquire read lock: {}", e))?;

        let mut result: Vec<TestRecord> = rows
            .iter()
            .filter(|r| !active_only || r.is_active)
            .cloned()
            .collect();
        result.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(result)
    }

    async fn find_by_handle(&self, handle: &Handle) -> Result<TestRecord, IndexError> {
        let rows = self
            .inner
            .read()
            .map_err(|e| anyhow::anyhow!("failed to acquire read lock: {}", e))?;
        rows.iter()
            .find(|r| r.name_handle.as_ref() == Some(handle) && r.is_active)
            .cloned()
            .ok_or_else(|| IndexError::NotFound(handle.to_string()))
    }

    async fn update_content_hash(
        &self,
        handle: &Handle,
        hash: &ContentHash,
    ) -> Result<(), IndexError> {
        let mut rows = self
            .inner
            .write()
            .map_err(|e| anyhow::anyhow!("failed to acquire write lock: {}", e))?;
        let row = rows
            .iter_mut()
            .find(|r| r.name_handle.as_ref() == Some(handle) && r.is_active)
            .ok_or_else(|| IndexError::NotFound(handle.to_string()))?;
        row.content_hash = hash.clone();
        row.updated_at = OffsetDateTime::now_utc();
        Ok(())
    }

    async fn mark_published(&self, hash: &ContentHash, handle: &Handle) -> Result<(), IndexError> {
        let mut rows = self
            .inner
            .write()
            .map_err(|e| anyhow::anyhow!("failed to acquire write lock: {}", e))?;

        if rows.iter().any(|r| r.name_handle.as_ref() == Some(handle)) {
            return Err(IndexError::DuplicateHandle(handle.clone()));
        }

        let row = rows
            .iter_mut()
            .find(|r| &r.content_hash == hash && r.is_active)
            .ok_or_else(|| IndexError::NotFound(hash.to_string()))?;
        row.name_handle = Some(handle.clone());
        row.updated_at = OffsetDateTime::now_utc();
        Ok(())
    }
}
