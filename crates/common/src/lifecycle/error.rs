use crate::content::{ContentError, ContentHash};
use crate::crypto::CryptoError;
use crate::index::IndexError;
use crate::naming::{Handle, NamingError};

/// Errors surfaced at the orchestrator boundary
///
/// Every failure carries the step it happened in. The orchestrator performs
/// no silent retries; retry and backoff policy belong to the caller, and
/// `Crypto` failures must never be retried at all.
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("{0} requires ownership of the record")]
    Permission(&'static str),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("content network error while {step}: {source}")]
    Content {
        step: &'static str,
        #[source]
        source: ContentError,
    },
    #[error("naming service error while {step}: {source}")]
    Naming {
        step: &'static str,
        #[source]
        source: NamingError,
    },
    #[error("index error while {step}: {source}")]
    Index {
        step: &'static str,
        #[source]
        source: IndexError,
    },
    #[error("crypto failure: {0}")]
    Crypto(#[from] CryptoError),
    /// The publish went out but the local commit did not land: the index is
    /// now behind what the naming service resolves. Detectable, not
    /// auto-healable, and deliberately distinct from a network failure.
    #[error("published {handle} -> {content_hash} but the local commit failed: {source}")]
    Consistency {
        handle: Handle,
        content_hash: ContentHash,
        #[source]
        source: IndexError,
    },
}

impl LifecycleError {
    pub(super) fn content(step: &'static str, source: ContentError) -> Self {
        Self::Content { step, source }
    }

    pub(super) fn naming(step: &'static str, source: NamingError) -> Self {
        Self::Naming { step, source }
    }

    pub(super) fn index(step: &'static str, source: IndexError) -> Self {
        Self::Index { step, source }
    }
}
