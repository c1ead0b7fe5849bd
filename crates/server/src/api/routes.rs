use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::{handlers, indexers, middleware::metrics_middleware};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Indexers
        .route("/indexers", get(indexers::list_indexers))
        .route("/indexers/rss", get(indexers::eligible_for_rss))
        .route("/indexers/search", get(indexers::eligible_for_search))
        .route("/indexers/blocked", get(indexers::list_blocked))
        .route("/indexers/status", get(indexers::list_statuses))
        .route("/indexers/reload", post(indexers::reload))
        .route("/indexers/{id}", get(indexers::get_indexer))
        .route("/indexers/{id}/failure", post(indexers::record_failure))
        .route("/indexers/{id}/success", post(indexers::record_success))
        // Substitution
        .route("/substitution/refresh", post(indexers::refresh_substitution));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::metrics))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
