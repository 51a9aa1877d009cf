use axum::Router;

pub mod tests;

use service::ServiceState;

pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new()
        .nest("/tests", tests::router(state.clone()))
        .with_state(state)
}
