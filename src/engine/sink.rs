use serde::Serialize;

use crate::metrics::{EndpointLatencyRecord, EndpointLatencyReport, MetricRow, MetricStatus};

/// Live charts the engine keeps a sliding window for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesId {
    Cpu,
    Memory,
    Rps,
    Latency,
    ErrorRate,
}

impl SeriesId {
    pub const ALL: [SeriesId; 5] = [
        SeriesId::Cpu,
        SeriesId::Memory,
        SeriesId::Rps,
        SeriesId::Latency,
        SeriesId::ErrorRate,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Self::Cpu => "CPU %",
            Self::Memory => "Memory used (MB)",
            Self::Rps => "Requests/sec",
            Self::Latency => "Latency (ms)",
            Self::ErrorRate => "Error %",
        }
    }
}

/// One-way notifications from the engine to whatever presents its output.
///
/// Called from the single active invocation of a cycle; implementations must
/// not block for long and must not call back into the engine.
pub trait ReportingSink: Send + Sync {
    fn on_series_update(&self, series: SeriesId, labels: &[String], values: &[f64]);

    fn on_table_update(&self, rows: &[MetricRow]);

    fn on_ranking(&self, top: &[EndpointLatencyRecord]);

    fn on_status(&self, metric: &str, status: MetricStatus);

    /// Full endpoint table with its status breakdown.
    fn on_endpoint_latency(&self, _report: &EndpointLatencyReport) {}

    fn on_health(&self, _status: Option<&str>) {}
}
