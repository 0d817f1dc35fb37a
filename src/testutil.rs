//! In-process stand-in for the management interface used by the tests.
//!
//! Meters carry tags; requests narrow them with `tag=k:v` and get the
//! aggregate plus the remaining `availableTags`, the same way the real
//! interface answers.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use parking_lot::Mutex;
use serde_json::{json, Value};

use crate::actuator::MetricsClient;
use crate::engine::{ReportingSink, SeriesId};
use crate::metrics::{EndpointLatencyRecord, EndpointLatencyReport, MetricRow, MetricStatus};

#[derive(Debug, Clone)]
pub enum Fault {
    Status(u16),
    EmptyBody,
    Garbage,
    Delay(Duration),
}

#[derive(Debug, Clone)]
enum Reading {
    Timer { count: u64, total: f64, max: f64 },
    Gauge(f64),
}

#[derive(Debug, Clone)]
struct Meter {
    name: String,
    tags: Vec<(String, String)>,
    reading: Reading,
}

#[derive(Default)]
struct Inner {
    meters: Vec<Meter>,
    faults: HashMap<String, Fault>,
    failing_scopes: Vec<(String, String)>,
    health: Option<String>,
    hits: HashMap<String, usize>,
}

#[derive(Clone, Default)]
pub struct FakeActuator {
    inner: Arc<Mutex<Inner>>,
    total_hits: Arc<AtomicUsize>,
}

impl FakeActuator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a timer meter or, when the tag set already exists, adds to it.
    pub fn timer(&self, name: &str, tags: &[(&str, &str)], count: u64, total: f64, max: f64) {
        let tags = owned(tags);
        let mut inner = self.inner.lock();
        if let Some(m) = inner.meters.iter_mut().find(|m| m.name == name && m.tags == tags) {
            if let Reading::Timer { count: c, total: t, max: mx } = &mut m.reading {
                *c += count;
                *t += total;
                *mx = mx.max(max);
            }
            return;
        }
        inner.meters.push(Meter {
            name: name.to_owned(),
            tags,
            reading: Reading::Timer { count, total, max },
        });
    }

    pub fn gauge(&self, name: &str, tags: &[(&str, &str)], value: f64) {
        let tags = owned(tags);
        let mut inner = self.inner.lock();
        if let Some(m) = inner.meters.iter_mut().find(|m| m.name == name && m.tags == tags) {
            m.reading = Reading::Gauge(value);
            return;
        }
        inner.meters.push(Meter {
            name: name.to_owned(),
            tags,
            reading: Reading::Gauge(value),
        });
    }

    pub fn fault(&self, name: &str, fault: Fault) {
        self.inner.lock().faults.insert(name.to_owned(), fault);
    }

    /// Requests narrowed by `tag=key:value` answer 500, whatever the metric.
    pub fn fail_scope(&self, key: &str, value: &str) {
        self.inner
            .lock()
            .failing_scopes
            .push((key.to_owned(), value.to_owned()));
    }

    pub fn clear_fault(&self, name: &str) {
        self.inner.lock().faults.remove(name);
    }

    pub fn health(&self, status: &str) {
        self.inner.lock().health = Some(status.to_owned());
    }

    /// Requests served for one metric name, any tag combination.
    pub fn hits(&self, name: &str) -> usize {
        self.inner.lock().hits.get(name).copied().unwrap_or(0)
    }

    pub fn total_hits(&self) -> usize {
        self.total_hits.load(Ordering::SeqCst)
    }

    pub async fn start(&self) -> MetricsClient {
        self.start_with_timeout(Duration::from_secs(2)).await
    }

    pub async fn start_with_timeout(&self, timeout: Duration) -> MetricsClient {
        let app = Router::new()
            .route("/actuator/health", get(health))
            .route("/actuator/metrics", get(names))
            .route("/actuator/metrics/:name", get(metric))
            .with_state(self.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        MetricsClient::new(&format!("http://{addr}/actuator"), timeout).unwrap()
    }
}

fn owned(tags: &[(&str, &str)]) -> Vec<(String, String)> {
    tags.iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect()
}

async fn health(State(fake): State<FakeActuator>) -> Response {
    fake.total_hits.fetch_add(1, Ordering::SeqCst);
    match fake.inner.lock().health.clone() {
        Some(status) => Json(json!({ "status": status })).into_response(),
        None => StatusCode::SERVICE_UNAVAILABLE.into_response(),
    }
}

async fn names(State(fake): State<FakeActuator>) -> Json<Value> {
    fake.total_hits.fetch_add(1, Ordering::SeqCst);
    let names: BTreeSet<String> = fake.inner.lock().meters.iter().map(|m| m.name.clone()).collect();
    Json(json!({ "names": names }))
}

async fn metric(
    State(fake): State<FakeActuator>,
    Path(name): Path<String>,
    Query(query): Query<Vec<(String, String)>>,
) -> Response {
    fake.total_hits.fetch_add(1, Ordering::SeqCst);

    let fault = {
        let mut inner = fake.inner.lock();
        *inner.hits.entry(name.clone()).or_default() += 1;
        inner.faults.get(&name).cloned()
    };
    match fault {
        Some(Fault::Status(code)) => {
            return StatusCode::from_u16(code)
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
                .into_response()
        }
        Some(Fault::EmptyBody) => return StatusCode::OK.into_response(),
        Some(Fault::Garbage) => return (StatusCode::OK, "{not json").into_response(),
        Some(Fault::Delay(d)) => tokio::time::sleep(d).await,
        None => {}
    }

    let constraints: Vec<(String, String)> = query
        .into_iter()
        .filter(|(k, _)| k == "tag")
        .filter_map(|(_, v)| v.split_once(':').map(|(k, v)| (k.to_owned(), v.to_owned())))
        .collect();

    let inner = fake.inner.lock();
    if constraints.iter().any(|c| inner.failing_scopes.contains(c)) {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    let matching: Vec<&Meter> = inner
        .meters
        .iter()
        .filter(|m| m.name == name)
        .filter(|m| constraints.iter().all(|c| m.tags.contains(c)))
        .collect();
    if matching.is_empty() {
        return StatusCode::NOT_FOUND.into_response();
    }

    let mut count = 0u64;
    let mut total = 0.0f64;
    let mut max = 0.0f64;
    let mut value = 0.0f64;
    let mut timers = false;
    let mut available: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for m in &matching {
        match m.reading {
            Reading::Timer { count: c, total: t, max: mx } => {
                timers = true;
                count += c;
                total += t;
                max = max.max(mx);
            }
            Reading::Gauge(v) => value += v,
        }
        for (k, v) in &m.tags {
            if constraints.iter().any(|(ck, _)| ck == k) {
                continue;
            }
            let values = available.entry(k.clone()).or_default();
            if !values.contains(v) {
                values.push(v.clone());
            }
        }
    }

    let measurements = if timers {
        json!([
            { "statistic": "COUNT", "value": count as f64 },
            { "statistic": "TOTAL_TIME", "value": total },
            { "statistic": "MAX", "value": max },
        ])
    } else {
        json!([{ "statistic": "VALUE", "value": value }])
    };
    let available_tags: Vec<Value> = available
        .into_iter()
        .map(|(tag, values)| json!({ "tag": tag, "values": values }))
        .collect();

    Json(json!({
        "name": name,
        "measurements": measurements,
        "availableTags": available_tags,
    }))
    .into_response()
}

// ─── Recording sink ──────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum SinkEvent {
    Series(SeriesId, Vec<String>, Vec<f64>),
    Table(Vec<MetricRow>),
    Ranking(Vec<EndpointLatencyRecord>),
    Status(String, MetricStatus),
    Endpoints(EndpointLatencyReport),
    Health(Option<String>),
}

/// Captures every notification in arrival order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<SinkEvent>>,
}

impl RecordingSink {
    pub fn last_values(&self, id: SeriesId) -> Option<Vec<f64>> {
        self.events.lock().iter().rev().find_map(|e| match e {
            SinkEvent::Series(s, _, values) if *s == id => Some(values.clone()),
            _ => None,
        })
    }

    pub fn series_updates(&self, id: SeriesId) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|e| matches!(e, SinkEvent::Series(s, _, _) if *s == id))
            .count()
    }

    pub fn last_table(&self) -> Option<Vec<MetricRow>> {
        self.events.lock().iter().rev().find_map(|e| match e {
            SinkEvent::Table(rows) => Some(rows.clone()),
            _ => None,
        })
    }

    pub fn last_ranking(&self) -> Option<Vec<EndpointLatencyRecord>> {
        self.events.lock().iter().rev().find_map(|e| match e {
            SinkEvent::Ranking(top) => Some(top.clone()),
            _ => None,
        })
    }

    pub fn last_endpoint_report(&self) -> Option<EndpointLatencyReport> {
        self.events.lock().iter().rev().find_map(|e| match e {
            SinkEvent::Endpoints(report) => Some(report.clone()),
            _ => None,
        })
    }

    pub fn last_health(&self) -> Option<Option<String>> {
        self.events.lock().iter().rev().find_map(|e| match e {
            SinkEvent::Health(status) => Some(status.clone()),
            _ => None,
        })
    }

    pub fn status_of(&self, metric: &str) -> Option<MetricStatus> {
        self.events.lock().iter().rev().find_map(|e| match e {
            SinkEvent::Status(name, status) if name == metric => Some(*status),
            _ => None,
        })
    }
}

impl ReportingSink for RecordingSink {
    fn on_series_update(&self, series: SeriesId, labels: &[String], values: &[f64]) {
        self.events
            .lock()
            .push(SinkEvent::Series(series, labels.to_vec(), values.to_vec()));
    }

    fn on_table_update(&self, rows: &[MetricRow]) {
        self.events.lock().push(SinkEvent::Table(rows.to_vec()));
    }

    fn on_ranking(&self, top: &[EndpointLatencyRecord]) {
        self.events.lock().push(SinkEvent::Ranking(top.to_vec()));
    }

    fn on_status(&self, metric: &str, status: MetricStatus) {
        self.events
            .lock()
            .push(SinkEvent::Status(metric.to_owned(), status));
    }

    fn on_endpoint_latency(&self, report: &EndpointLatencyReport) {
        self.events.lock().push(SinkEvent::Endpoints(report.clone()));
    }

    fn on_health(&self, status: Option<&str>) {
        self.events
            .lock()
            .push(SinkEvent::Health(status.map(str::to_owned)));
    }
}
