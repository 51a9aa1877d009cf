use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::content::ContentHash;

/// HTTP-style headers recorded at upload time and replayed on download,
/// each name mapping to an ordered list of values
pub type Headers = BTreeMap<String, Vec<String>>;

/// An artifact attached to a test
///
/// `content_hash` points at the artifact's own encrypted blob in the content
/// network, independent of the metadata blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub name: String,
    pub description: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub content_hash: ContentHash,
    pub headers: Headers,
}

impl Artifact {
    pub fn new(name: &str, description: &str, content_hash: ContentHash, headers: Headers) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            created_at: OffsetDateTime::now_utc(),
            content_hash,
            headers,
        }
    }
}
