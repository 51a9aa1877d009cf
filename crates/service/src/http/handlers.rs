use axum::response::{IntoResponse, Response};

pub async fn not_found_handler() -> Response {
    (http::StatusCode::NOT_FOUND, "not found").into_response()
}
