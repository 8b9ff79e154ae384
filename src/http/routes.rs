use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Script generation
        .route(
            "/api/meditations/generate",
            post(handlers::generate_meditation),
        )
        // Narration
        .route("/api/narration", post(handlers::synthesize_narration))
        .route("/api/narration/preview", post(handlers::preview_voice))
        // Saved sessions
        .route(
            "/api/sessions",
            get(handlers::list_sessions).post(handlers::save_session),
        )
        .route(
            "/api/sessions/:id",
            get(handlers::get_session).delete(handlers::delete_session),
        )
        // Stats
        .route("/api/stats", get(handlers::get_stats))
        .route("/api/stats/sessions", post(handlers::record_session))
        .layer(CorsLayer::permissive())
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
