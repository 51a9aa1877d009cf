use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use common::content::ContentHash;
use common::crypto::Secret;
use common::index::{RecordStatus, TestRecord};
use common::naming::Handle;

use service::ServiceState;

pub mod create;
pub mod import;
pub mod members;
pub mod share;

pub use error::TestsApiError;

pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new()
        .route("/", get(list::handler).post(create::handler))
        .route("/share", post(share::handler))
        .route("/import", post(import::handler))
        .route("/hash/:content_hash", get(fetch::by_hash_handler))
        .route("/:handle", get(fetch::handler).delete(remove::handler))
        .route("/:handle/members", post(members::handler))
        .route("/:handle/artifacts", post(artifacts::upload_handler))
        .route(
            "/:handle/artifacts/:artifact_hash",
            get(artifacts::download_handler),
        )
        .with_state(state)
}

/// The index row as the API reports it
///
/// The secret is included: this API is the owner's loopback surface, and the
/// secret is what they hand to collaborators alongside the handle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestSummary {
    pub handle: Option<Handle>,
    pub content_hash: ContentHash,
    pub secret: Secret,
    pub is_owner: bool,
    pub status: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<TestRecord> for TestSummary {
    fn from(record: TestRecord) -> Self {
        let status = match record.status() {
            RecordStatus::Stored => "stored",
            RecordStatus::Published => "published",
        };
        Self {
            handle: record.name_handle,
            content_hash: record.content_hash,
            secret: record.secret,
            is_owner: record.is_owner,
            status: status.to_string(),
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}
