use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;

use crate::engine::{ReportingSink, SeriesId};
use crate::metrics::{EndpointLatencyRecord, EndpointLatencyReport, MetricRow, MetricStatus, StatusBreakdown};

/// One chart as the browser draws it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SeriesPanel {
    pub title: &'static str,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

/// Endpoint latency table row, times already in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EndpointRow {
    pub label: String,
    pub endpoint: String,
    pub method: String,
    pub count: u64,
    pub avg_latency_ms: f64,
    pub max_time_ms: f64,
}

impl From<&EndpointLatencyRecord> for EndpointRow {
    fn from(r: &EndpointLatencyRecord) -> Self {
        Self {
            label: r.label(),
            endpoint: r.endpoint.clone(),
            method: r.method.clone(),
            count: r.count,
            avg_latency_ms: r.avg_latency_ms,
            max_time_ms: r.max_time_ms(),
        }
    }
}

/// Everything the dashboard shows, as last published by the engine.
/// Values stay until the next publication replaces them.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DashboardSnapshot {
    pub health: String,
    pub series: BTreeMap<SeriesId, SeriesPanel>,
    pub metrics: Vec<MetricRow>,
    pub statuses: BTreeMap<String, MetricStatus>,
    pub endpoints: Vec<EndpointRow>,
    pub endpoints_truncated: bool,
    pub status_breakdown: Option<StatusBreakdown>,
    pub top_endpoints: Vec<EndpointRow>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// [`ReportingSink`] that keeps the latest published values for the HTTP
/// handlers and the SSE stream to read.
pub struct DashboardSink {
    inner: Mutex<DashboardSnapshot>,
}

impl DashboardSink {
    pub fn new() -> Self {
        let snapshot = DashboardSnapshot {
            health: "N/A".into(),
            series: SeriesId::ALL
                .into_iter()
                .map(|id| {
                    let panel = SeriesPanel {
                        title: id.title(),
                        ..SeriesPanel::default()
                    };
                    (id, panel)
                })
                .collect(),
            ..DashboardSnapshot::default()
        };
        Self {
            inner: Mutex::new(snapshot),
        }
    }

    pub fn snapshot(&self) -> DashboardSnapshot {
        self.inner.lock().clone()
    }

    pub fn series(&self, id: SeriesId) -> SeriesPanel {
        self.inner.lock().series.get(&id).cloned().unwrap_or_default()
    }

    pub fn metrics(&self) -> Vec<MetricRow> {
        self.inner.lock().metrics.clone()
    }

    fn update(&self, f: impl FnOnce(&mut DashboardSnapshot)) {
        let mut snapshot = self.inner.lock();
        f(&mut snapshot);
        snapshot.updated_at = Some(Utc::now());
    }
}

impl Default for DashboardSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportingSink for DashboardSink {
    fn on_series_update(&self, series: SeriesId, labels: &[String], values: &[f64]) {
        self.update(|s| {
            s.series.insert(
                series,
                SeriesPanel {
                    title: series.title(),
                    labels: labels.to_vec(),
                    values: values.to_vec(),
                },
            );
        });
    }

    /// Replaces the table; badges of metrics no longer listed go with it.
    fn on_table_update(&self, rows: &[MetricRow]) {
        self.update(|s| {
            s.statuses = rows.iter().map(|r| (r.name.clone(), r.status)).collect();
            s.metrics = rows.to_vec();
        });
    }

    fn on_ranking(&self, top: &[EndpointLatencyRecord]) {
        self.update(|s| s.top_endpoints = top.iter().map(EndpointRow::from).collect());
    }

    fn on_status(&self, metric: &str, status: MetricStatus) {
        self.update(|s| {
            s.statuses.insert(metric.to_owned(), status);
        });
    }

    fn on_endpoint_latency(&self, report: &EndpointLatencyReport) {
        self.update(|s| {
            s.endpoints = report.records.iter().map(EndpointRow::from).collect();
            s.endpoints_truncated = report.truncated;
            s.status_breakdown = Some(report.breakdown.clone());
        });
    }

    fn on_health(&self, status: Option<&str>) {
        self.update(|s| s.health = status.unwrap_or("N/A").to_owned());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actuator::MetricSnapshot;
    use crate::metrics::endpoints::StatusBuckets;

    fn record(endpoint: &str, count: u64, total: f64) -> EndpointLatencyRecord {
        EndpointLatencyRecord {
            endpoint: endpoint.into(),
            method: "GET".into(),
            count,
            total_time_seconds: total,
            max_time_seconds: 0.3,
            avg_latency_ms: crate::metrics::endpoints::avg_latency_ms(count, total),
        }
    }

    #[test]
    fn starts_with_titled_empty_panels_and_na_health() {
        let sink = DashboardSink::new();
        let snap = sink.snapshot();
        assert_eq!(snap.health, "N/A");
        assert_eq!(snap.series.len(), SeriesId::ALL.len());
        assert_eq!(sink.series(SeriesId::Rps).title, "Requests/sec");
        assert!(snap.updated_at.is_none());
    }

    #[test]
    fn keeps_the_latest_publication() {
        let sink = DashboardSink::new();
        sink.on_series_update(SeriesId::Cpu, &["12:00:00".into()], &[12.5]);
        sink.on_health(Some("UP"));
        sink.on_endpoint_latency(&EndpointLatencyReport {
            records: vec![record("/clients", 40, 2.0)],
            breakdown: StatusBreakdown::ByClass {
                dimension: crate::metrics::endpoints::StatusDimension::Status,
                buckets: [(2, 40)].into_iter().collect::<StatusBuckets>(),
            },
            truncated: false,
        });
        sink.on_health(None);

        let snap = sink.snapshot();
        assert_eq!(snap.series[&SeriesId::Cpu].values, [12.5]);
        assert_eq!(snap.health, "N/A");
        assert_eq!(snap.endpoints[0].label, "/clients [GET]");
        assert!((snap.endpoints[0].max_time_ms - 300.0).abs() < 1e-9);
        assert!(snap.updated_at.is_some());
    }

    #[test]
    fn table_update_drops_badges_of_vanished_metrics() {
        let row = |name: &str| MetricRow::from_snapshot(&MetricSnapshot::empty(name, &[]));
        let sink = DashboardSink::new();
        sink.on_table_update(&[row("jvm.threads.live"), row("process.uptime")]);
        sink.on_status("process.uptime", MetricStatus::Ok);
        assert_eq!(sink.snapshot().statuses.len(), 2);

        sink.on_table_update(&[row("jvm.threads.live")]);
        let snap = sink.snapshot();
        assert_eq!(snap.statuses.len(), 1);
        assert_eq!(snap.statuses["jvm.threads.live"], MetricStatus::Unknown);
        assert!(!snap.statuses.contains_key("process.uptime"));
    }

    #[test]
    fn snapshot_serializes_with_string_series_keys() {
        let sink = DashboardSink::new();
        sink.on_series_update(SeriesId::ErrorRate, &["t".into()], &[10.0]);
        let json = serde_json::to_value(sink.snapshot()).unwrap();
        assert_eq!(json["series"]["error_rate"]["values"][0], 10.0);
        assert_eq!(json["series"]["error_rate"]["title"], "Error %");
    }
}
