//! Liveness and readiness probes.

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;

use crate::state::State as ServiceState;

pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new()
        .route("/livez", get(livez_handler))
        .route("/healthz", get(healthz_handler))
        .with_state(state)
}

async fn livez_handler() -> Response {
    (http::StatusCode::OK, "ok").into_response()
}

/// Ready only when the index answers queries
async fn healthz_handler(State(state): State<ServiceState>) -> Response {
    match sqlx::query("SELECT 1 as id")
        .fetch_one(&**state.database())
        .await
    {
        Ok(_) => (http::StatusCode::OK, "ok").into_response(),
        Err(e) => {
            tracing::error!("health check failed: {}", e);
            (http::StatusCode::SERVICE_UNAVAILABLE, "database unavailable").into_response()
        }
    }
}
