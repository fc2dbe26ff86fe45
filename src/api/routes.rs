use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::request_id::{make_span_with_request_id, request_id_middleware};

use super::handlers;
use super::AppState;

/// Creates the stub router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        // Session
        .route("/signup", post(handlers::signup))
        .route("/login", post(handlers::login))
        .route("/logout", post(handlers::logout))
        // Watchlist
        .route("/watchlist", get(handlers::get_watchlist))
        .route("/watchlist/add", post(handlers::add_to_watchlist))
        .route("/watchlist/remove", post(handlers::remove_from_watchlist))
        // Recommendations
        .route(
            "/recommend_from_watchlist",
            get(handlers::recommend_from_watchlist),
        )
        .route("/recommendations", get(handlers::recommendations))
        // Assistant
        .route("/chat", post(handlers::chat))
        .with_state(state)
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        .layer(CorsLayer::permissive())
        .layer(middleware::from_fn(request_id_middleware))
}
