use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/api/dashboard", get(handlers::get_dashboard))
        .route("/api/search", post(handlers::search))
        .route("/api/lucky", post(handlers::lucky))
        .route("/api/reset", post(handlers::reset))
        .route("/api/charts/:kind", get(handlers::get_chart))
        .route("/api/samples", get(handlers::get_samples))
        .with_state(state)
}
