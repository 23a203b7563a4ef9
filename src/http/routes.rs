use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::handlers;
use super::state::AppState;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Live session control
        .route("/live/start", post(handlers::start_live))
        .route("/live/stop", post(handlers::stop_live))
        .route("/live/status", get(handlers::live_status))
        // One-shot speech playback
        .route("/speech/say", post(handlers::say))
        // Request logging + permissive CORS for the portal frontend
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
