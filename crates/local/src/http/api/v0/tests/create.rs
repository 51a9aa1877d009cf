use axum::extract::{Json, State};
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};

use common::content::ContentHash;
use common::crypto::Secret;
use common::naming::Handle;
use common::record::Metadata;

use service::ServiceState;

use super::TestsApiError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTestRequest {
    pub name: String,
    pub description: String,
    /// Publish a handle for the new test in the same call
    #[serde(default)]
    pub share: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTestResponse {
    pub content_hash: ContentHash,
    pub secret: Secret,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handle: Option<Handle>,
    pub metadata: Metadata,
}

/// Create a new test record
/// POST /api/v0/tests
pub async fn handler(
    State(state): State<ServiceState>,
    Json(req): Json<CreateTestRequest>,
) -> Result<impl IntoResponse, TestsApiError> {
    if req.name.trim().is_empty() {
        return Err(TestsApiError::InvalidRequest(
            "test name must not be empty".to_string(),
        ));
    }

    let (created, handle) = if req.share {
        let (created, handle) = state
            .store()
            .create_shared_test(&req.name, &req.description, &req.name)
            .await?;
        (created, Some(handle))
    } else {
        let created = state.store().create_test(&req.name, &req.description).await?;
        (created, None)
    };

    Ok((
        http::StatusCode::CREATED,
        Json(CreateTestResponse {
            content_hash: created.content_hash,
            secret: created.secret,
            handle,
            metadata: created.metadata,
        }),
    )
        .into_response())
}
