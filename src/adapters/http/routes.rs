//! Route wiring for the configurator HTTP surface.

use axum::routing::{get, post};
use axum::Router;

use super::handlers::{health, post_message, AppState};

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/configurator/message", post(post_message))
        .route("/health", get(health))
        .with_state(state)
}
