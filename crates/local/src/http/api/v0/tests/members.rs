use axum::extract::{Json, Path, State};
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};

use common::naming::Handle;
use common::record::Metadata;

use service::ServiceState;

use super::TestsApiError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddMemberRequest {
    pub name: String,
    pub email: String,
    pub role: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddMemberResponse {
    pub handle: Handle,
    pub metadata: Metadata,
}

/// Append a member to an owned test
/// POST /api/v0/tests/:handle/members
pub async fn handler(
    State(state): State<ServiceState>,
    Path(handle): Path<String>,
    Json(req): Json<AddMemberRequest>,
) -> Result<impl IntoResponse, TestsApiError> {
    if req.name.trim().is_empty() || req.email.trim().is_empty() {
        return Err(TestsApiError::InvalidRequest(
            "member name and email must not be empty".to_string(),
        ));
    }

    let handle = Handle::from(handle);
    let metadata = state
        .store()
        .add_member(&handle, &req.name, &req.email, &req.role)
        .await?;

    Ok(Json(AddMemberResponse { handle, metadata }))
}
