//! Shared test utilities for lifecycle integration tests
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use common::content::{ContentError, ContentHash, ContentStore, MemoryContentStore};
use common::index::{IndexError, MemoryTestIndex, NewTestRecord, TestIndex, TestRecord};
use common::lifecycle::TestStore;
use common::naming::{Handle, MemoryNameResolver, NameResolver, NamingError};

pub type Store = TestStore<MemoryContentStore, MemoryNameResolver, MemoryTestIndex>;

/// Set up an orchestrator over in-memory collaborators, returning each
/// collaborator for direct inspection
pub fn setup() -> (Store, MemoryContentStore, MemoryNameResolver, MemoryTestIndex) {
    let content = MemoryContentStore::new();
    let naming = MemoryNameResolver::new();
    let index = MemoryTestIndex::new();
    let store = TestStore::new(content.clone(), naming.clone(), index.clone());
    (store, content, naming, index)
}

/// A naming service whose publish can be made to fail on demand
#[derive(Clone)]
pub struct FlakyNameResolver {
    inner: MemoryNameResolver,
    fail_publish: Arc<AtomicBool>,
}

impl FlakyNameResolver {
    pub fn new(inner: MemoryNameResolver) -> Self {
        Self {
            inner,
            fail_publish: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn fail_publish(&self, fail: bool) {
        self.fail_publish.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl NameResolver for FlakyNameResolver {
    async fn generate_handle(&self, label: &str) -> Result<Handle, NamingError> {
        self.inner.generate_handle(label).await
    }

    async fn find_handle(&self, label: &str) -> Result<Option<Handle>, NamingError> {
        self.inner.find_handle(label).await
    }

    async fn publish(
        &self,
        handle: &Handle,
        hash: &ContentHash,
        allow_offline: bool,
    ) -> Result<(), NamingError> {
        if self.fail_publish.load(Ordering::SeqCst) {
            return Err(NamingError::Provider(anyhow::anyhow!(
                "injected publish failure"
            )));
        }
        self.inner.publish(handle, hash, allow_offline).await
    }

    async fn resolve(&self, handle: &Handle, timeout: Duration) -> Result<ContentHash, NamingError> {
        self.inner.resolve(handle, timeout).await
    }
}

/// An index whose commit writes (the ones that run after a successful
/// publish) can be made to fail on demand
#[derive(Clone)]
pub struct FlakyTestIndex {
    inner: MemoryTestIndex,
    fail_commits: Arc<AtomicBool>,
}

impl FlakyTestIndex {
    pub fn new(inner: MemoryTestIndex) -> Self {
        Self {
            inner,
            fail_commits: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn fail_commits(&self, fail: bool) {
        self.fail_commits.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl TestIndex for FlakyTestIndex {
    async fn insert(&self, record: NewTestRecord) -> Result<(), IndexError> {
        self.inner.insert(record).await
    }

    async fn find_all(&self, active_only: bool) -> Result<Vec<TestRecord>, IndexError> {
        self.inner.find_all(active_only).await
    }

    async fn find_by_handle(&self, handle: &Handle) -> Result<TestRecord, IndexError> {
        self.inner.find_by_handle(handle).await
    }

    async fn update_content_hash(
        &self,
        handle: &Handle,
        hash: &ContentHash,
    ) -> Result<(), IndexError> {
        if self.fail_commits.load(Ordering::SeqCst) {
            return Err(IndexError::Provider(anyhow::anyhow!(
                "injected commit failure"
            )));
        }
        self.inner.update_content_hash(handle, hash).await
    }

    async fn mark_published(&self, hash: &ContentHash, handle: &Handle) -> Result<(), IndexError> {
        if self.fail_commits.load(Ordering::SeqCst) {
            return Err(IndexError::Provider(anyhow::anyhow!(
                "injected commit failure"
            )));
        }
        self.inner.mark_published(hash, handle).await
    }
}

/// A content store that counts every call it sees
#[derive(Clone)]
pub struct CountingContentStore {
    inner: MemoryContentStore,
    pub calls: Arc<AtomicUsize>,
}

impl CountingContentStore {
    pub fn new(inner: MemoryContentStore) -> Self {
        Self {
            inner,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentStore for CountingContentStore {
    async fn put(&self, bytes: Bytes, pin: bool) -> Result<ContentHash, ContentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.put(bytes, pin).await
    }

    async fn get(&self, hash: &ContentHash, timeout: Duration) -> Result<Bytes, ContentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.get(hash, timeout).await
    }
}

/// A naming service that counts every call it sees
#[derive(Clone)]
pub struct CountingNameResolver {
    inner: MemoryNameResolver,
    pub calls: Arc<AtomicUsize>,
}

impl CountingNameResolver {
    pub fn new(inner: MemoryNameResolver) -> Self {
        Self {
            inner,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NameResolver for CountingNameResolver {
    async fn generate_handle(&self, label: &str) -> Result<Handle, NamingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.generate_handle(label).await
    }

    async fn find_handle(&self, label: &str) -> Result<Option<Handle>, NamingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.find_handle(label).await
    }

    async fn publish(
        &self,
        handle: &Handle,
        hash: &ContentHash,
        allow_offline: bool,
    ) -> Result<(), NamingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.publish(handle, hash, allow_offline).await
    }

    async fn resolve(&self, handle: &Handle, timeout: Duration) -> Result<ContentHash, NamingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.resolve(handle, timeout).await
    }
}
