pub mod routes;
pub mod state;

use axum::{extract::DefaultBodyLimit, routing::{get, post}, Router};
use tower_http::trace::TraceLayer;

use crate::adapters::http::state::HttpState;

/// Largest accepted upload.
pub const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

pub fn router(state: HttpState) -> Router {
    Router::new()
        .route("/api/config", get(routes::get_config))
        .route("/api/strictness", get(routes::get_strictness))
        .route("/api/detect", post(routes::detect))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
