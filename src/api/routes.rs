use axum::{
    routing::{delete, get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::handlers;
use super::AppState;

/// Creates the main API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/api/v1", api_routes())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// API routes under /api/v1
fn api_routes() -> Router<AppState> {
    Router::new()
        // Dataset lifecycle
        .route("/dataset", get(handlers::get_dataset))
        .route("/dataset/reload", post(handlers::reload_dataset))
        .route("/dataset/cache", delete(handlers::invalidate_cache))
        // Recommendations
        .route("/users", get(handlers::get_users))
        .route(
            "/users/:user_id/recommendations",
            get(handlers::get_recommendations),
        )
        .route("/movies/similar", get(handlers::similar_movies))
        // Snapshots
        .route("/exports", post(handlers::export_snapshots))
}
