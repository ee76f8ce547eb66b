use crate::handlers;
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/api/periods", get(handlers::get_periods))
        .route("/api/summary", get(handlers::get_summary))
        .route("/api/health", get(handlers::health))
        .with_state(state)
}
