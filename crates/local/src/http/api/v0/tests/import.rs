use axum::extract::{Json, State};
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};

use common::crypto::Secret;
use common::naming::Handle;
use common::record::Metadata;

use service::ServiceState;

use super::{TestSummary, TestsApiError};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportTestRequest {
    pub handle: Handle,
    pub secret: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportTestResponse {
    pub test: TestSummary,
    pub metadata: Metadata,
}

/// Import a test someone else shared, given its handle and secret
/// POST /api/v0/tests/import
pub async fn handler(
    State(state): State<ServiceState>,
    Json(req): Json<ImportTestRequest>,
) -> Result<impl IntoResponse, TestsApiError> {
    let secret = Secret::parse(&req.secret)
        .map_err(|e| TestsApiError::InvalidRequest(e.to_string()))?;

    let imported = state.store().import_test(&req.handle, &secret).await?;

    Ok((
        http::StatusCode::CREATED,
        Json(ImportTestResponse {
            test: TestSummary::from(imported.record),
            metadata: imported.metadata,
        }),
    )
        .into_response())
}
