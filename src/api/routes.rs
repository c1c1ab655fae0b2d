//! API route definitions

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{self, ApiState};

/// Create all `/api/v1` routes
pub fn api_routes(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(handlers::get_health))
        .route("/options", get(handlers::get_options))
        .route("/plan", post(handlers::post_plan))
        .with_state(state)
}
