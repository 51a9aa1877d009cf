/**
 * Cryptographic types and operations.
 *  - Secret generation and purpose-scoped key derivation
 *  - Channel-bound AEAD encryption for metadata and artifacts
 */
pub mod crypto;
/**
 * Consumed interface to the content-addressed storage
 *  network: put/get immutable blobs by hash.
 */
pub mod content;
/**
 * Consumed interface to the local index: the durable
 *  handle -> last-known content hash mapping.
 */
pub mod index;
/**
 * The lifecycle orchestrator. Composes crypto, content
 *  network, naming service and local index into
 *  create/share/read/mutate operations with a
 *  read-modify-publish-commit discipline.
 */
pub mod lifecycle;
/**
 * Consumed interface to the naming service: mutable,
 *  identity-backed pointers to content hashes.
 */
pub mod naming;
/**
 * Record entities: test metadata, members and artifacts.
 */
pub mod record;

pub mod prelude {
    pub use crate::content::{ContentHash, ContentStore};
    pub use crate::crypto::{DerivedKeys, Secret};
    pub use crate::index::{TestIndex, TestRecord};
    pub use crate::lifecycle::{LifecycleError, TestStore};
    pub use crate::naming::{Handle, NameResolver};
    pub use crate::record::{Artifact, Member, Metadata};
}
