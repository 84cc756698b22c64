use crate::state::AppState;
use axum::{http::StatusCode, routing::get, Router};

/// Liveness probe handler
async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// Readiness probe handler.
/// The service holds no connections, so it is ready as soon as it listens.
async fn readiness() -> StatusCode {
    StatusCode::OK
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness))
}
