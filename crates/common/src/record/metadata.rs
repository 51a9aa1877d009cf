use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::content::ContentHash;

use super::artifact::{Artifact, Headers};
use super::member::Member;

/// Errors raised while mutating metadata
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("a member with this name and email already exists")]
    DuplicateMember,
    #[error("metadata codec error: {0}")]
    Codec(#[from] serde_json::Error),
}

/// The metadata file of a test
///
/// This is the plaintext that lives encrypted behind a test's content hash.
/// `revision` is advisory: it is bumped per publish but never enforced as an
/// optimistic-concurrency guard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub name: String,
    pub description: String,
    pub revision: u32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub artifacts: Vec<Artifact>,
    pub members: Vec<Member>,
}

impl Metadata {
    pub fn new(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            revision: 1,
            created_at: OffsetDateTime::now_utc(),
            artifacts: Vec::new(),
            members: Vec::new(),
        }
    }

    pub fn from_json(data: &[u8]) -> Result<Self, RecordError> {
        Ok(serde_json::from_slice(data)?)
    }

    pub fn to_json(&self) -> Result<Vec<u8>, RecordError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Append a member, enforcing case-insensitive (name, email) uniqueness
    pub fn add_member(&mut self, member: Member) -> Result<(), RecordError> {
        if self.members.iter().any(|m| m.same_identity(&member)) {
            return Err(RecordError::DuplicateMember);
        }
        self.members.push(member);
        Ok(())
    }

    /// Append an artifact entry referencing an already-stored encrypted blob
    pub fn add_artifact(
        &mut self,
        name: &str,
        description: &str,
        content_hash: ContentHash,
        headers: Headers,
    ) -> &Artifact {
        self.artifacts
            .push(Artifact::new(name, description, content_hash, headers));
        self.artifacts.last().expect("artifact was just appended")
    }

    /// Locate an artifact entry by its content hash
    pub fn find_artifact(&self, content_hash: &ContentHash) -> Option<&Artifact> {
        self.artifacts
            .iter()
            .find(|a| &a.content_hash == content_hash)
    }

    /// Advance the advisory revision counter ahead of a publish
    pub fn bump_revision(&mut self) {
        self.revision += 1;
    }
}
