use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ─── Measurement vocabulary ──────────────────────────────────────

/// Statistic kinds reported by the management interface for one meter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Statistic {
    Value,
    Count,
    TotalTime,
    Total,
    Max,
    ActiveTasks,
    Duration,
    #[serde(other)]
    Unknown,
}

/// One `{statistic, value}` pair from a metric response.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeasurementSample {
    pub statistic: Statistic,
    pub value: f64,
}

// ─── Wire shapes ─────────────────────────────────────────────────

/// `GET {base}/metrics/{name}` body. Every field is optional because an
/// empty body is a valid "no data" answer.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricBody {
    #[serde(default)]
    pub measurements: Vec<MeasurementSample>,
    #[serde(default)]
    pub available_tags: Vec<AvailableTag>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AvailableTag {
    pub tag: String,
    #[serde(default)]
    pub values: Vec<String>,
}

/// `GET {base}/metrics` body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetricNames {
    #[serde(default)]
    pub names: Vec<String>,
}

/// `GET {base}/health` body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HealthBody {
    #[serde(default)]
    pub status: Option<String>,
}

// ─── Snapshot ────────────────────────────────────────────────────

/// One fetched view of a metric, optionally narrowed to a tag combination.
///
/// Built fresh on every fetch and thrown away once the tick has derived its
/// values. An empty snapshot (no measurements, no tags) is how a failed or
/// empty fetch is represented.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricSnapshot {
    pub name: String,
    /// The `tag=k:v` constraints this snapshot was requested with.
    pub tags: BTreeMap<String, String>,
    pub measurements: Vec<MeasurementSample>,
    /// Remaining dimension values, in the order the upstream listed them.
    pub available_tag_values: BTreeMap<String, Vec<String>>,
}

impl MetricSnapshot {
    pub fn empty(name: &str, tags: &[(&str, &str)]) -> Self {
        Self {
            name: name.to_owned(),
            tags: collect_tags(tags),
            ..Self::default()
        }
    }

    pub(crate) fn from_body(name: &str, tags: &[(&str, &str)], body: MetricBody) -> Self {
        // First occurrence wins so statistic names stay unique.
        let mut measurements: Vec<MeasurementSample> = Vec::with_capacity(body.measurements.len());
        for sample in body.measurements {
            if !measurements.iter().any(|m| m.statistic == sample.statistic) {
                measurements.push(sample);
            }
        }

        let available_tag_values = body
            .available_tags
            .into_iter()
            .map(|t| (t.tag, t.values))
            .collect();

        Self {
            name: name.to_owned(),
            tags: collect_tags(tags),
            measurements,
            available_tag_values,
        }
    }

    /// `true` when the upstream returned at least one measurement.
    pub fn has_data(&self) -> bool {
        !self.measurements.is_empty()
    }

    pub fn statistic(&self, statistic: Statistic) -> Option<f64> {
        self.measurements
            .iter()
            .find(|m| m.statistic == statistic)
            .map(|m| m.value)
    }

    /// Same as [`statistic`](Self::statistic) but defaults to 0.
    pub fn statistic_or_zero(&self, statistic: Statistic) -> f64 {
        self.statistic(statistic).unwrap_or(0.0)
    }

    /// Value of the first measurement, whatever its statistic. Gauges expose
    /// a single `VALUE`, the metrics table shows the first entry.
    pub fn first_value(&self) -> Option<f64> {
        self.measurements.first().map(|m| m.value)
    }

    pub fn tag_values(&self, key: &str) -> &[String] {
        self.available_tag_values
            .get(key)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn has_tag(&self, key: &str) -> bool {
        self.available_tag_values.contains_key(key)
    }
}

fn collect_tags(tags: &[(&str, &str)]) -> BTreeMap<String, String> {
    tags.iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect()
}
