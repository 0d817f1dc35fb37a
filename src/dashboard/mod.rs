//! HTTP face of the dashboard: serves what the engine last published and
//! accepts manual refresh requests.

pub mod routes;
pub mod server;
pub mod sink;

use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::engine::Engine;

pub use sink::DashboardSink;

/// Shared state available to every handler via `State<Arc<AppState>>`.
pub struct AppState {
    /// Engine, for out-of-band refreshes.
    pub engine: Arc<Engine>,

    /// Latest published values; handlers and the SSE stream read snapshots.
    pub sink: Arc<DashboardSink>,
}

// ─── Unified error type ──────────────────────────────────────────

#[derive(Debug)]
pub enum AppError {
    NotFound(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
        };

        let body = serde_json::json!({
            "error":  message,
            "status": status.as_u16(),
        });

        (status, Json(body)).into_response()
    }
}
