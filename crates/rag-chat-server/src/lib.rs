pub mod config;
pub mod document;
pub mod handlers;
pub mod logging;
pub mod middleware;
pub mod models;
pub mod services;
pub mod state;
pub mod utils;
pub mod vector;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, TraceLayer},
};

pub use state::AppState;

/// Build the HTTP router over the shared state
pub fn create_router(state: AppState) -> Router {
    let max_upload_bytes = state.settings.ingestion.max_upload_bytes;

    let api = Router::new()
        .route("/health", get(handlers::health_check))
        .route(
            "/chat",
            post(handlers::chat_handler)
                .route_layer(axum::middleware::from_fn(middleware::require_json)),
        )
        .route("/context", delete(handlers::clear_context_handler))
        .route("/rag", post(handlers::upload_handler));

    Router::new()
        .nest("/api/v1", api)
        .fallback(handlers::not_found)
        .with_state(state)
        .layer(axum::middleware::map_response(
            middleware::json_method_not_allowed,
        ))
        .layer(axum::middleware::from_fn(middleware::log_request))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::default()))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
}
