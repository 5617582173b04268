use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::{handlers, middleware, series, webhook};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Webhook ingress carries the optional shared-secret check; the
    // read-only surface does not.
    let webhook_routes = Router::new()
        .route("/webhook", post(webhook::webhook))
        .layer(from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ));

    Router::new()
        // Health, config, metrics
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        .route("/metrics", get(handlers::metrics))
        .route("/sync/status", get(handlers::sync_status))
        // Catalog (read-only)
        .route("/series", get(series::get_series))
        .route("/series/{id}", get(series::get_series_by_id))
        .route("/series/{id}/episodes", get(series::get_episodes))
        .route("/calendar", get(series::get_calendar))
        .merge(webhook_routes)
        .layer(axum::middleware::from_fn(middleware::metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
