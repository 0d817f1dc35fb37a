use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use serde::Deserialize;
use tokio_stream::wrappers::IntervalStream;
use tokio_stream::StreamExt;

use crate::engine::{RefreshOutcome, SeriesId};
use crate::metrics::status::filter_rows;
use crate::metrics::MetricRow;

use super::sink::{DashboardSnapshot, SeriesPanel};
use super::{AppError, AppState};

#[derive(Debug, Default, Deserialize)]
pub struct MetricsQuery {
    #[serde(default)]
    pub q: String,
}

// ─── GET /api/dashboard ──────────────────────────────────────────
/// Full snapshot, useful for curl / debugging.

pub async fn get_dashboard(State(state): State<Arc<AppState>>) -> Json<DashboardSnapshot> {
    Json(state.sink.snapshot())
}

// ─── GET /api/dashboard/metrics?q= ───────────────────────────────

pub async fn get_metrics(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MetricsQuery>,
) -> Json<Vec<MetricRow>> {
    let rows = state.sink.metrics();
    Json(filter_rows(&rows, &query.q).into_iter().cloned().collect())
}

// ─── GET /api/dashboard/series/:id ───────────────────────────────

pub async fn get_series(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SeriesPanel>, AppError> {
    let id = parse_series(&id).ok_or_else(|| AppError::NotFound(format!("no series '{id}'")))?;
    Ok(Json(state.sink.series(id)))
}

fn parse_series(raw: &str) -> Option<SeriesId> {
    match raw {
        "cpu" => Some(SeriesId::Cpu),
        "memory" => Some(SeriesId::Memory),
        "rps" => Some(SeriesId::Rps),
        "latency" => Some(SeriesId::Latency),
        "error_rate" => Some(SeriesId::ErrorRate),
        _ => None,
    }
}

// ─── POST /api/refresh ───────────────────────────────────────────
/// Runs both cycles now. A cycle that is already in flight reports
/// `skipped` rather than waiting.

pub async fn post_refresh(State(state): State<Arc<AppState>>) -> Json<RefreshOutcome> {
    Json(state.engine.refresh().await)
}

// ─── GET /api/dashboard/stream ───────────────────────────────────
/// Server-Sent Events endpoint.
/// Pushes the full `DashboardSnapshot` as JSON once per second.

pub async fn dashboard_stream(
    State(state): State<Arc<AppState>>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>> {
    let interval = tokio::time::interval(Duration::from_secs(1));

    let stream = IntervalStream::new(interval).map(move |_| {
        let snapshot = state.sink.snapshot();
        let json = serde_json::to_string(&snapshot).unwrap_or_default();
        Ok(Event::default().data(json))
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
