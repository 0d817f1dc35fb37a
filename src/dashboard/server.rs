use axum::{
    middleware as axum_mw,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::middleware::timing;

use super::routes;
use super::AppState;

/// Builds the full Axum `Router` with all routes and middleware.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // ── Read side ───────────────────────────────────────────
        .route("/api/dashboard", get(routes::get_dashboard))
        .route("/api/dashboard/metrics", get(routes::get_metrics))
        .route("/api/dashboard/series/:id", get(routes::get_series))
        .route("/api/dashboard/stream", get(routes::dashboard_stream))
        // ── Manual refresh ──────────────────────────────────────
        .route("/api/refresh", post(routes::post_refresh))
        // ── Provide shared state to all routes above ────────────
        .with_state(state)
        // ── Global middleware (applied bottom-up) ───────────────
        .layer(axum_mw::from_fn(timing::timing_middleware))
        .layer(CorsLayer::permissive())
}
