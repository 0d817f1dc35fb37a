use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::task::JoinSet;

use crate::actuator::{MetricSnapshot, MetricsClient, Statistic};

/// Composite request timer broken down by `uri` and `method`.
pub const HTTP_SERVER_REQUESTS: &str = "http.server.requests";

pub const DEFAULT_MAX_PAIRS: usize = 64;

/// Status-narrowed fetches allowed per pass, across all pairs.
pub const DEFAULT_MAX_STATUS_FETCHES: usize = 64;

/// Placeholder uri some frameworks report for the context root.
const ROOT_SENTINEL: &str = "root";

// ─── Records ─────────────────────────────────────────────────────

/// Latency summary for one `(endpoint, method)` combination.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EndpointLatencyRecord {
    pub endpoint: String,
    pub method: String,
    pub count: u64,
    pub total_time_seconds: f64,
    pub max_time_seconds: f64,
    pub avg_latency_ms: f64,
}

impl EndpointLatencyRecord {
    /// Builds a record from a snapshot scoped to one combination.
    /// `None` when the combination saw no traffic.
    pub fn from_snapshot(endpoint: &str, method: &str, snapshot: &MetricSnapshot) -> Option<Self> {
        let count = as_count(snapshot.statistic_or_zero(Statistic::Count));
        if count == 0 {
            return None;
        }
        let total_time_seconds = snapshot.statistic_or_zero(Statistic::TotalTime);
        Some(Self {
            endpoint: endpoint.to_owned(),
            method: method.to_owned(),
            count,
            total_time_seconds,
            max_time_seconds: snapshot.statistic_or_zero(Statistic::Max),
            avg_latency_ms: avg_latency_ms(count, total_time_seconds),
        })
    }

    pub fn max_time_ms(&self) -> f64 {
        self.max_time_seconds * 1000.0
    }

    /// Chart label, e.g. `/clients [GET]`.
    pub fn label(&self) -> String {
        format!("{} [{}]", self.endpoint, self.method)
    }
}

/// `(total / count) * 1000`, or 0 with no traffic.
pub fn avg_latency_ms(count: u64, total_time_seconds: f64) -> f64 {
    if count == 0 {
        return 0.0;
    }
    (total_time_seconds / count as f64) * 1000.0
}

pub(crate) fn as_count(value: f64) -> u64 {
    if value.is_finite() && value > 0.0 {
        value.round() as u64
    } else {
        0
    }
}

// ─── Status classes ──────────────────────────────────────────────

/// Tag dimension the request timer is split by for response classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusDimension {
    /// Numeric status code, e.g. `404`.
    Status,
    /// Coarse outcome, e.g. `CLIENT_ERROR`.
    Outcome,
}

impl StatusDimension {
    pub fn tag(self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::Outcome => "outcome",
        }
    }

    /// Prefers `status` over `outcome`; `None` when the upstream exposes neither.
    pub fn detect(composite: &MetricSnapshot) -> Option<Self> {
        [Self::Status, Self::Outcome]
            .into_iter()
            .find(|d| composite.has_tag(d.tag()))
    }

    /// Leading digit of the status class (1..=5).
    pub fn class_of(self, value: &str) -> Option<u8> {
        match self {
            Self::Status => value
                .chars()
                .next()
                .and_then(|c| c.to_digit(10))
                .filter(|d| (1..=5).contains(d))
                .map(|d| d as u8),
            Self::Outcome => match value {
                "INFORMATIONAL" => Some(1),
                "SUCCESS" => Some(2),
                "REDIRECTION" => Some(3),
                "CLIENT_ERROR" => Some(4),
                "SERVER_ERROR" => Some(5),
                _ => None,
            },
        }
    }
}

/// Request counts per status class.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatusBuckets {
    pub classes: BTreeMap<u8, u64>,
    /// Counted requests whose class could not be determined.
    pub unattributed: u64,
}

impl StatusBuckets {
    pub fn add(&mut self, class: u8, count: u64) {
        *self.classes.entry(class).or_default() += count;
    }

    pub fn count(&self, class: u8) -> u64 {
        self.classes.get(&class).copied().unwrap_or(0)
    }

    /// Classified requests only.
    pub fn total(&self) -> u64 {
        self.classes.values().sum()
    }

    /// `100 * (4xx + 5xx) / total`, or 0 when nothing was classified.
    pub fn error_percent(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        100.0 * (self.count(4) + self.count(5)) as f64 / total as f64
    }
}

impl FromIterator<(u8, u64)> for StatusBuckets {
    fn from_iter<I: IntoIterator<Item = (u8, u64)>>(iter: I) -> Self {
        let mut buckets = Self::default();
        for (class, count) in iter {
            buckets.add(class, count);
        }
        buckets
    }
}

/// Per-class breakdown, or only the aggregate when the upstream does not
/// split requests by status.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StatusBreakdown {
    ByClass {
        dimension: StatusDimension,
        buckets: StatusBuckets,
    },
    Unavailable {
        total: u64,
    },
}

impl StatusBreakdown {
    pub fn error_percent(&self) -> Option<f64> {
        match self {
            Self::ByClass { buckets, .. } => Some(buckets.error_percent()),
            Self::Unavailable { .. } => None,
        }
    }
}

// ─── Aggregator ──────────────────────────────────────────────────

/// Result of one aggregation pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EndpointLatencyReport {
    /// Records in discovery order (uri-major, then method).
    pub records: Vec<EndpointLatencyRecord>,
    pub breakdown: StatusBreakdown,
    /// The pair cap or the status fetch budget cut this pass short.
    pub truncated: bool,
}

/// Fans out one scoped fetch per `(uri, method)` pair of the composite
/// request timer and turns each answer into an [`EndpointLatencyRecord`].
#[derive(Debug, Clone)]
pub struct EndpointLatencyAggregator {
    metric: String,
    management_prefix: String,
    max_pairs: usize,
    max_status_fetches: usize,
}

struct PairMeasurement {
    record: EndpointLatencyRecord,
    classes: Vec<(u8, u64)>,
    unattributed: u64,
    /// The status budget ran out before every value was fetched.
    starved: bool,
}

impl EndpointLatencyAggregator {
    pub fn new(management_prefix: &str, max_pairs: usize) -> Self {
        Self {
            metric: HTTP_SERVER_REQUESTS.to_owned(),
            management_prefix: management_prefix.to_owned(),
            max_pairs,
            max_status_fetches: DEFAULT_MAX_STATUS_FETCHES,
        }
    }

    /// Caps the status-narrowed fetches one pass may issue.
    pub fn with_status_budget(mut self, max_status_fetches: usize) -> Self {
        self.max_status_fetches = max_status_fetches;
        self
    }

    /// Management endpoints, the root sentinel and blank uris.
    pub fn is_noise(&self, uri: &str) -> bool {
        uri.is_empty()
            || uri == ROOT_SENTINEL
            || (!self.management_prefix.is_empty() && uri.starts_with(&self.management_prefix))
    }

    /// Cross product of interesting uris and methods, cut at the pair cap.
    /// The flag reports whether anything was cut.
    pub fn candidate_pairs(&self, composite: &MetricSnapshot) -> (Vec<(String, String)>, bool) {
        let methods = composite.tag_values("method");
        let uris = composite
            .tag_values("uri")
            .iter()
            .filter(|uri| !self.is_noise(uri));

        let mut pairs = Vec::new();
        let mut wanted = 0usize;
        for uri in uris {
            for method in methods {
                wanted += 1;
                if pairs.len() < self.max_pairs {
                    pairs.push((uri.clone(), method.clone()));
                }
            }
        }

        let truncated = wanted > pairs.len();
        if truncated {
            tracing::warn!(
                metric = %self.metric,
                wanted,
                cap = self.max_pairs,
                "endpoint pair cap reached, truncating this pass"
            );
        }
        (pairs, truncated)
    }

    pub async fn collect(&self, client: &MetricsClient) -> EndpointLatencyReport {
        let composite = client.fetch_metric(&self.metric, &[]).await;
        let dimension = StatusDimension::detect(&composite);
        let (pairs, mut truncated) = self.candidate_pairs(&composite);
        let budget = Arc::new(AtomicUsize::new(self.max_status_fetches));

        let mut tasks = JoinSet::new();
        for (idx, (uri, method)) in pairs.into_iter().enumerate() {
            let client = client.clone();
            let metric = self.metric.clone();
            let budget = budget.clone();
            tasks.spawn(async move {
                let measured = measure_pair(&client, &metric, &uri, &method, dimension, &budget).await;
                (idx, measured)
            });
        }

        let mut measured = Vec::with_capacity(tasks.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(result) => measured.push(result),
                Err(err) => tracing::warn!(error = %err, "endpoint fetch task failed"),
            }
        }
        // Completion order is arbitrary; restore discovery order.
        measured.sort_by_key(|(idx, _)| *idx);

        let mut records = Vec::with_capacity(measured.len());
        let mut buckets = StatusBuckets::default();
        let mut starved = false;
        for m in measured.into_iter().filter_map(|(_, m)| m) {
            for (class, count) in m.classes {
                buckets.add(class, count);
            }
            buckets.unattributed += m.unattributed;
            starved |= m.starved;
            records.push(m.record);
        }
        if starved {
            tracing::warn!(
                metric = %self.metric,
                budget = self.max_status_fetches,
                unattributed = buckets.unattributed,
                "status fetch budget exhausted, remaining counts left unattributed"
            );
            truncated = true;
        }

        let breakdown = match dimension {
            Some(dimension) => StatusBreakdown::ByClass { dimension, buckets },
            None => StatusBreakdown::Unavailable {
                total: records.iter().map(|r| r.count).sum(),
            },
        };

        EndpointLatencyReport {
            records,
            breakdown,
            truncated,
        }
    }
}

async fn measure_pair(
    client: &MetricsClient,
    metric: &str,
    uri: &str,
    method: &str,
    dimension: Option<StatusDimension>,
    budget: &AtomicUsize,
) -> Option<PairMeasurement> {
    let scoped = client
        .fetch_metric(metric, &[("uri", uri), ("method", method)])
        .await;

    let Some(record) = EndpointLatencyRecord::from_snapshot(uri, method, &scoped) else {
        tracing::debug!(uri, method, "no traffic, pair skipped");
        return None;
    };

    let mut measured = PairMeasurement {
        classes: Vec::new(),
        unattributed: 0,
        starved: false,
        record,
    };
    let Some(dimension) = dimension else {
        return Some(measured);
    };

    let count = measured.record.count;
    match scoped.tag_values(dimension.tag()) {
        [] => measured.unattributed = count,
        [only] => match dimension.class_of(only) {
            Some(class) => measured.classes.push((class, count)),
            None => measured.unattributed = count,
        },
        several => {
            let mut classified = 0u64;
            for value in several {
                if !take_one(budget) {
                    measured.starved = true;
                    break;
                }
                let narrowed = client
                    .fetch_metric(metric, &[("uri", uri), ("method", method), (dimension.tag(), value.as_str())])
                    .await;
                let n = as_count(narrowed.statistic_or_zero(Statistic::Count));
                if let Some(class) = dimension.class_of(value) {
                    measured.classes.push((class, n));
                    classified += n;
                }
            }
            // Failed, unclassifiable and unfetched values keep their share.
            measured.unattributed = count.saturating_sub(classified);
        }
    }
    Some(measured)
}

fn take_one(budget: &AtomicUsize) -> bool {
    budget
        .fetch_update(Ordering::AcqRel, Ordering::Acquire, |left| left.checked_sub(1))
        .is_ok()
}
