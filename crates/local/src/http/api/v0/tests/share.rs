use axum::extract::{Json, State};
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};

use common::content::ContentHash;
use common::naming::Handle;

use service::ServiceState;

use super::TestsApiError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareTestRequest {
    pub content_hash: ContentHash,
    pub label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareTestResponse {
    pub handle: Handle,
    pub content_hash: ContentHash,
}

/// Publish a handle for a stored test
/// POST /api/v0/tests/share
pub async fn handler(
    State(state): State<ServiceState>,
    Json(req): Json<ShareTestRequest>,
) -> Result<impl IntoResponse, TestsApiError> {
    if req.label.trim().is_empty() {
        return Err(TestsApiError::InvalidRequest(
            "share label must not be empty".to_string(),
        ));
    }

    let handle = state
        .store()
        .share_test(&req.content_hash, &req.label)
        .await?;

    Ok(Json(ShareTestResponse {
        handle,
        content_hash: req.content_hash,
    }))
}
