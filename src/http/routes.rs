use super::handlers;
use super::state::AppState;
use axum::{routing::get, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Live transcription
        .route("/ws/transcribe", get(handlers::transcribe_socket))
        // Session queries
        .route("/sessions", get(handlers::list_sessions))
        .route(
            "/sessions/:session_id/status",
            get(handlers::get_session_status),
        )
        // Browser clients connect from other origins
        .layer(CorsLayer::permissive())
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
