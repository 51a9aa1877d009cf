//! The test lifecycle orchestrator
//!
//! Composes the codec, the content network, the naming service and the local
//! index into create/share/read/mutate operations. Two rules govern every
//! code path here:
//!
//! - The local index is an accelerator, never a source of truth: read paths
//!   always resolve the handle and fetch at the resolved hash, reconciling
//!   the cache when it is stale.
//! - Publish before commit: a mutation's new pointer is written to the
//!   index only after the naming service accepted the publish. On any
//!   failure mid-sequence the index is left exactly as it was.

use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::content::{ContentHash, ContentStore, FETCH_TIMEOUT};
use crate::crypto::Secret;
use crate::index::{IndexError, NewTestRecord, TestIndex, TestRecord};
use crate::naming::{Handle, NameResolver, NamingError, PUBLISH_TIMEOUT, RESOLVE_TIMEOUT};
use crate::record::{Artifact, Headers, Member, Metadata};

use super::error::LifecycleError;

/// The result of creating a test
#[derive(Debug, Clone)]
pub struct CreatedTest {
    pub content_hash: ContentHash,
    pub secret: Secret,
    pub metadata: Metadata,
}

/// The result of resolving a test through its handle
#[derive(Debug, Clone)]
pub struct ResolvedTest {
    pub record: TestRecord,
    pub metadata: Metadata,
    /// The authoritative hash the handle currently resolves to
    pub content_hash: ContentHash,
}

/// The test lifecycle orchestrator
///
/// A single coarse guard serializes every collaborator call made through one
/// instance: the collaborators are not assumed safe for unsynchronized
/// concurrent use, so at most one privileged operation is in flight at a
/// time. The one sanctioned exception is handle acquisition, which runs on
/// its own task so asymmetric keygen latency overlaps upload latency.
#[derive(Clone)]
pub struct TestStore<C, N, X> {
    content: C,
    naming: N,
    index: X,
    guard: Arc<tokio::sync::Mutex<()>>,
}

impl<C, N, X> TestStore<C, N, X>
where
    C: ContentStore,
    N: NameResolver,
    X: TestIndex,
{
    pub fn new(content: C, naming: N, index: X) -> Self {
        Self {
            content,
            naming,
            index,
            guard: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    /// Create a new test: generate its secret, encrypt fresh metadata, store
    /// it pinned, and only then record it locally
    ///
    /// The index is written after the network write succeeds, so a local row
    /// can never point at content that was never stored.
    pub async fn create_test(
        &self,
        name: &str,
        description: &str,
    ) -> Result<CreatedTest, LifecycleError> {
        let secret = Secret::generate();
        let metadata = Metadata::new(name, description);
        let blob = Self::seal_metadata(&secret, &metadata)?;

        let _guard = self.guard.lock().await;
        let content_hash = self
            .content
            .put(blob, true)
            .await
            .map_err(|e| LifecycleError::content("storing metadata blob", e))?;
        self.index
            .insert(NewTestRecord::stored(content_hash.clone(), secret.clone()))
            .await
            .map_err(|e| LifecycleError::index("inserting new record", e))?;

        tracing::info!(hash = %content_hash, name, "created test");
        Ok(CreatedTest {
            content_hash,
            secret,
            metadata,
        })
    }

    /// Share a stored test under a naming handle
    ///
    /// Reuses an existing handle for `label` when the naming service has one,
    /// otherwise generates a fresh identity. The acquisition runs on its own
    /// task; publish and the local commit run under the guard. If the publish
    /// fails, the index is untouched.
    pub async fn share_test(
        &self,
        content_hash: &ContentHash,
        label: &str,
    ) -> Result<Handle, LifecycleError> {
        let acquisition = self.spawn_handle_acquisition(label);

        let _guard = self.guard.lock().await;
        let handle = Self::join_handle_acquisition(acquisition).await?;
        self.publish_new_handle(&handle, content_hash).await?;

        tracing::info!(handle = %handle, hash = %content_hash, "shared test");
        Ok(handle)
    }

    /// Non-blocking variant of [`share_test`](Self::share_test)
    ///
    /// Dispatches the share sequence on an independent task and reports
    /// exactly once through the returned one-shot channel, carrying either
    /// the handle or the error, never both. There is no cancellation once
    /// dispatched; callers bound their wait with the timeout budget.
    pub fn share_test_detached(
        &self,
        content_hash: ContentHash,
        label: String,
    ) -> oneshot::Receiver<Result<Handle, LifecycleError>> {
        let (tx, rx) = oneshot::channel();
        let store = self.clone();
        tokio::spawn(async move {
            let result = store.share_test(&content_hash, &label).await;
            // the caller may have dropped the receiver; that is their choice
            let _ = tx.send(result);
        });
        rx
    }

    /// Create and immediately share a test
    ///
    /// Handle acquisition is launched first so RSA-class keygen latency
    /// overlaps the metadata upload; both results are joined before the
    /// publish. A publish failure leaves the record stored but unshared.
    pub async fn create_shared_test(
        &self,
        name: &str,
        description: &str,
        label: &str,
    ) -> Result<(CreatedTest, Handle), LifecycleError> {
        let acquisition = self.spawn_handle_acquisition(label);
        let created = self.create_test(name, description).await?;

        let _guard = self.guard.lock().await;
        let handle = Self::join_handle_acquisition(acquisition).await?;
        self.publish_new_handle(&handle, &created.content_hash).await?;

        tracing::info!(handle = %handle, hash = %created.content_hash, "created and shared test");
        Ok((created, handle))
    }

    /// Resolve a test through its handle with a caller-supplied secret
    ///
    /// The cached pointer is read first as a fast path but is never trusted
    /// for content: the blob is always fetched at the hash the naming
    /// service resolves right now. A stale cache is repaired as a side
    /// effect.
    pub async fn get_by_handle(
        &self,
        handle: &Handle,
        secret: &Secret,
    ) -> Result<ResolvedTest, LifecycleError> {
        let _guard = self.guard.lock().await;
        let record = self.find_record(handle).await?;
        self.read_current(handle, secret, record).await
    }

    /// Resolve a test through its handle using the record's stored secret
    pub async fn get_test(&self, handle: &Handle) -> Result<ResolvedTest, LifecycleError> {
        let _guard = self.guard.lock().await;
        let record = self.find_record(handle).await?;
        let secret = record.secret.clone();
        self.read_current(handle, &secret, record).await
    }

    /// Fetch and decrypt a test's metadata directly at a content hash
    ///
    /// Serves records that are stored but not yet shared, where no handle
    /// exists to resolve. Neither the naming service nor the index is
    /// consulted; the caller holds both the hash and the secret.
    pub async fn get_by_hash(
        &self,
        content_hash: &ContentHash,
        secret: &Secret,
    ) -> Result<Metadata, LifecycleError> {
        let _guard = self.guard.lock().await;
        let blob = self
            .content
            .get(content_hash, FETCH_TIMEOUT)
            .await
            .map_err(|e| LifecycleError::content("fetching metadata blob", e))?;
        let plaintext = secret.derive_keys().metadata_cipher().decrypt(&blob)?;
        Metadata::from_json(&plaintext)
            .map_err(|e| LifecycleError::Validation(format!("malformed metadata: {}", e)))
    }

    /// Append a member to an owned test's metadata
    ///
    /// Fails with `Permission` before any network call when the record is
    /// not owned. The publish must succeed before the local pointer advances.
    pub async fn add_member(
        &self,
        handle: &Handle,
        name: &str,
        email: &str,
        role: &str,
    ) -> Result<Metadata, LifecycleError> {
        let _guard = self.guard.lock().await;
        let record = self.find_record(handle).await?;
        if !record.is_owner {
            return Err(LifecycleError::Permission("add_member"));
        }

        let (_, mut metadata) = self.fetch_metadata(handle, &record.secret).await?;
        metadata
            .add_member(Member::new(name, email, role))
            .map_err(|e| LifecycleError::Validation(e.to_string()))?;
        metadata.bump_revision();

        self.commit_metadata(handle, &record.secret, &metadata)
            .await?;
        Ok(metadata)
    }

    /// Encrypt and store an artifact, then append it to an owned test's
    /// metadata
    ///
    /// The artifact blob gets its own content hash, independent of the
    /// metadata blob; both are pinned. The metadata update follows the same
    /// publish-then-commit sequence as [`add_member`](Self::add_member).
    pub async fn add_artifact(
        &self,
        handle: &Handle,
        name: &str,
        description: &str,
        file: &[u8],
        headers: Headers,
    ) -> Result<(Artifact, Metadata), LifecycleError> {
        let _guard = self.guard.lock().await;
        let record = self.find_record(handle).await?;
        if !record.is_owner {
            return Err(LifecycleError::Permission("add_artifact"));
        }

        let (_, mut metadata) = self.fetch_metadata(handle, &record.secret).await?;

        let encrypted = record.secret.derive_keys().artifact_cipher().encrypt(file)?;
        let artifact_hash = self
            .content
            .put(Bytes::from(encrypted), true)
            .await
            .map_err(|e| LifecycleError::content("storing artifact blob", e))?;

        let artifact = metadata
            .add_artifact(name, description, artifact_hash, headers)
            .clone();
        metadata.bump_revision();

        self.commit_metadata(handle, &record.secret, &metadata)
            .await?;
        Ok((artifact, metadata))
    }

    /// Fetch and decrypt one artifact of a test
    pub async fn get_artifact(
        &self,
        handle: &Handle,
        artifact_hash: &ContentHash,
    ) -> Result<(Artifact, Vec<u8>), LifecycleError> {
        let _guard = self.guard.lock().await;
        let record = self.find_record(handle).await?;
        let secret = record.secret.clone();
        let resolved = self.read_current(handle, &secret, record).await?;

        let artifact = resolved
            .metadata
            .find_artifact(artifact_hash)
            .cloned()
            .ok_or_else(|| LifecycleError::NotFound(format!("artifact {}", artifact_hash)))?;

        let blob = self
            .content
            .get(artifact_hash, FETCH_TIMEOUT)
            .await
            .map_err(|e| LifecycleError::content("fetching artifact blob", e))?;
        let bytes = secret.derive_keys().artifact_cipher().decrypt(&blob)?;

        Ok((artifact, bytes))
    }

    /// Import a test someone else shared: resolve and decrypt its metadata,
    /// then record it locally without ownership
    pub async fn import_test(
        &self,
        handle: &Handle,
        secret: &Secret,
    ) -> Result<ResolvedTest, LifecycleError> {
        let _guard = self.guard.lock().await;
        let (content_hash, metadata) = self.fetch_metadata(handle, secret).await?;

        self.index
            .insert(NewTestRecord::imported(
                handle.clone(),
                content_hash.clone(),
                secret.clone(),
            ))
            .await
            .map_err(|e| match e {
                IndexError::DuplicateHandle(h) => {
                    LifecycleError::Validation(format!("test already imported for handle {}", h))
                }
                other => LifecycleError::index("inserting imported record", other),
            })?;

        let record = self.find_record(handle).await?;
        tracing::info!(handle = %handle, hash = %content_hash, "imported test");
        Ok(ResolvedTest {
            record,
            metadata,
            content_hash,
        })
    }

    /// All locally known tests, most recently updated first
    pub async fn list_tests(&self, active_only: bool) -> Result<Vec<TestRecord>, LifecycleError> {
        let _guard = self.guard.lock().await;
        self.index
            .find_all(active_only)
            .await
            .map_err(|e| LifecycleError::index("listing records", e))
    }

    // ---- internals -------------------------------------------------------

    /// Find-or-generate a handle for `label` on an independent task
    ///
    /// Deliberately not under the collaborator guard: this is the one
    /// sanctioned overlap inside a logical operation.
    fn spawn_handle_acquisition(&self, label: &str) -> JoinHandle<Result<Handle, NamingError>> {
        let naming = self.naming.clone();
        let label = label.to_string();
        tokio::spawn(async move {
            match naming.find_handle(&label).await? {
                Some(handle) => Ok(handle),
                None => naming.generate_handle(&label).await,
            }
        })
    }

    async fn join_handle_acquisition(
        task: JoinHandle<Result<Handle, NamingError>>,
    ) -> Result<Handle, LifecycleError> {
        task.await
            .map_err(|e| {
                LifecycleError::naming(
                    "acquiring handle",
                    NamingError::Provider(anyhow::anyhow!("handle acquisition task failed: {}", e)),
                )
            })?
            .map_err(|e| LifecycleError::naming("acquiring handle", e))
    }

    /// Publish a first pointer for a fresh handle, then attach the handle to
    /// the local record
    ///
    /// The index refusing the attachment outright means the share request
    /// itself was bad, most commonly a record that is already shared. That
    /// maps to `Validation`; the pointer republished by the wasted publish is
    /// benign. Only an index that accepted the request but could not durably
    /// record it leaves the index behind the naming service, and only that
    /// maps to `Consistency`.
    async fn publish_new_handle(
        &self,
        handle: &Handle,
        content_hash: &ContentHash,
    ) -> Result<(), LifecycleError> {
        self.publish(handle, content_hash).await?;
        self.index
            .mark_published(content_hash, handle)
            .await
            .map_err(|source| match source {
                IndexError::DuplicateHandle(h) => LifecycleError::Validation(format!(
                    "handle {} already belongs to a shared record",
                    h
                )),
                IndexError::NotFound(_) => LifecycleError::Validation(format!(
                    "no unshared record holds hash {}",
                    content_hash
                )),
                source => LifecycleError::Consistency {
                    handle: handle.clone(),
                    content_hash: content_hash.clone(),
                    source,
                },
            })
    }

    async fn publish(
        &self,
        handle: &Handle,
        content_hash: &ContentHash,
    ) -> Result<(), LifecycleError> {
        match tokio::time::timeout(
            PUBLISH_TIMEOUT,
            self.naming.publish(handle, content_hash, true),
        )
        .await
        {
            Err(_) => Err(LifecycleError::naming(
                "publishing pointer",
                NamingError::Timeout(PUBLISH_TIMEOUT),
            )),
            Ok(Err(e)) => Err(LifecycleError::naming("publishing pointer", e)),
            Ok(Ok(())) => Ok(()),
        }
    }

    async fn find_record(&self, handle: &Handle) -> Result<TestRecord, LifecycleError> {
        self.index.find_by_handle(handle).await.map_err(|e| match e {
            IndexError::NotFound(_) => LifecycleError::NotFound(format!("test {}", handle)),
            other => LifecycleError::index("loading record", other),
        })
    }

    /// Resolve the handle, fetch and decrypt the metadata at the resolved
    /// hash. No cache involvement; callers must hold the guard.
    async fn fetch_metadata(
        &self,
        handle: &Handle,
        secret: &Secret,
    ) -> Result<(ContentHash, Metadata), LifecycleError> {
        let resolved = self
            .naming
            .resolve(handle, RESOLVE_TIMEOUT)
            .await
            .map_err(|e| LifecycleError::naming("resolving handle", e))?;
        let blob = self
            .content
            .get(&resolved, FETCH_TIMEOUT)
            .await
            .map_err(|e| LifecycleError::content("fetching metadata blob", e))?;
        let plaintext = secret.derive_keys().metadata_cipher().decrypt(&blob)?;
        let metadata = Metadata::from_json(&plaintext)
            .map_err(|e| LifecycleError::Validation(format!("malformed metadata: {}", e)))?;
        Ok((resolved, metadata))
    }

    /// The read path: fetch at the resolved hash and repair the cache when
    /// the resolution moved past it
    async fn read_current(
        &self,
        handle: &Handle,
        secret: &Secret,
        mut record: TestRecord,
    ) -> Result<ResolvedTest, LifecycleError> {
        let (resolved, metadata) = self.fetch_metadata(handle, secret).await?;

        if resolved != record.content_hash {
            tracing::debug!(
                handle = %handle,
                cached = %record.content_hash,
                resolved = %resolved,
                "cached pointer is stale, repairing"
            );
            self.index
                .update_content_hash(handle, &resolved)
                .await
                .map_err(|e| LifecycleError::index("repairing stale cache", e))?;
            record.content_hash = resolved.clone();
        }

        Ok(ResolvedTest {
            record,
            metadata,
            content_hash: resolved,
        })
    }

    /// The tail shared by every metadata mutation: encrypt, store,
    /// publish, and only then advance the local pointer
    async fn commit_metadata(
        &self,
        handle: &Handle,
        secret: &Secret,
        metadata: &Metadata,
    ) -> Result<ContentHash, LifecycleError> {
        let blob = Self::seal_metadata(secret, metadata)?;
        let content_hash = self
            .content
            .put(blob, true)
            .await
            .map_err(|e| LifecycleError::content("storing metadata blob", e))?;

        self.publish(handle, &content_hash).await?;

        self.index
            .update_content_hash(handle, &content_hash)
            .await
            .map_err(|source| LifecycleError::Consistency {
                handle: handle.clone(),
                content_hash: content_hash.clone(),
                source,
            })?;

        tracing::debug!(handle = %handle, hash = %content_hash, revision = metadata.revision, "committed metadata");
        Ok(content_hash)
    }

    fn seal_metadata(secret: &Secret, metadata: &Metadata) -> Result<Bytes, LifecycleError> {
        let json = metadata
            .to_json()
            .map_err(|e| LifecycleError::Validation(format!("failed to encode metadata: {}", e)))?;
        let blob = secret.derive_keys().metadata_cipher().encrypt(&json)?;
        Ok(Bytes::from(blob))
    }
}
