use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::Instant;

use crate::actuator::MetricsClient;
use crate::config::EngineConfig;
use crate::metrics::endpoints::HTTP_SERVER_REQUESTS;
use crate::metrics::scalars::{self, JVM_MEMORY_USED, SYSTEM_CPU_USAGE};
use crate::metrics::{ranking, EndpointLatencyAggregator, MetricRow, SeriesView};

use super::guard::{CycleGuard, CycleOutcome};
use super::sink::{ReportingSink, SeriesId};
use super::state::EngineState;

/// The two periodic cycles the scheduler drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Cycle {
    /// Scalar charts, then the endpoint latency pass.
    Fast,
    /// Health probe and the full metrics table.
    Slow,
}

/// Outcome of an out-of-band refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RefreshOutcome {
    pub fast: CycleOutcome,
    pub slow: CycleOutcome,
}

/// The aggregation engine: fetches, derives and publishes.
///
/// All cycle entry points are guarded; a call that overlaps a running
/// invocation of the same cycle returns [`CycleOutcome::Skipped`] at once.
pub struct Engine {
    client: MetricsClient,
    config: EngineConfig,
    aggregator: EndpointLatencyAggregator,
    sink: Arc<dyn ReportingSink>,
    state: Mutex<EngineState>,
    fast: CycleGuard,
    slow: CycleGuard,
}

impl Engine {
    pub fn new(client: MetricsClient, config: EngineConfig, sink: Arc<dyn ReportingSink>) -> Self {
        Self {
            aggregator: EndpointLatencyAggregator::new(&config.management_prefix, config.max_pairs)
                .with_status_budget(config.max_status_fetches),
            state: Mutex::new(EngineState::new(config.window_capacity)),
            client,
            config,
            sink,
            fast: CycleGuard::new("fast"),
            slow: CycleGuard::new("slow"),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub async fn run(&self, cycle: Cycle) -> CycleOutcome {
        match cycle {
            Cycle::Fast => self.run_fast_cycle().await,
            Cycle::Slow => self.run_slow_cycle().await,
        }
    }

    /// Runs both cycles now, subject to the same guards as the timers.
    pub async fn refresh(&self) -> RefreshOutcome {
        let (fast, slow) = tokio::join!(self.run_fast_cycle(), self.run_slow_cycle());
        RefreshOutcome { fast, slow }
    }

    // ── Fast cycle ──────────────────────────────────────────────

    pub async fn run_fast_cycle(&self) -> CycleOutcome {
        let Some(_ticket) = self.fast.try_enter() else {
            tracing::debug!(cycle = self.fast.name(), "previous run still in flight, skipping");
            return CycleOutcome::Skipped;
        };

        let (cpu, memory, requests) = tokio::join!(
            self.client.fetch_metric(SYSTEM_CPU_USAGE, &[]),
            self.client.fetch_metric(JVM_MEMORY_USED, &[]),
            self.client.fetch_metric(HTTP_SERVER_REQUESTS, &[]),
        );

        let label = clock_label();
        let observed_at = Instant::now();

        // Absent readings skip the point instead of charting a fake zero.
        let updates: Vec<(SeriesId, SeriesView)> = {
            let mut state = self.state.lock();
            let rps = state.rate.observe_snapshot(&requests, observed_at);
            [
                (SeriesId::Cpu, scalars::cpu_percent(&cpu)),
                (SeriesId::Memory, scalars::memory_mb(&memory)),
                (SeriesId::Rps, rps),
                (SeriesId::Latency, scalars::cumulative_latency_ms(&requests)),
            ]
            .into_iter()
            .filter_map(|(id, value)| value.map(|v| (id, state.push(id, &label, v))))
            .collect()
        };

        for (id, view) in &updates {
            self.sink.on_series_update(*id, &view.labels, &view.values);
        }

        self.endpoint_pass().await;
        CycleOutcome::Completed
    }

    /// Endpoint latency pass. Runs only inside the fast cycle, so the fast
    /// guard also keeps it to one invocation at a time.
    async fn endpoint_pass(&self) {
        let report = self.aggregator.collect(&self.client).await;
        tracing::debug!(
            records = report.records.len(),
            truncated = report.truncated,
            "endpoint latency pass finished"
        );

        self.sink.on_endpoint_latency(&report);
        self.sink.on_ranking(&ranking::top_n(&report.records, self.config.top_n));

        match report.breakdown.error_percent() {
            Some(percent) => {
                let view = self.state.lock().push(SeriesId::ErrorRate, &clock_label(), percent);
                self.sink.on_series_update(SeriesId::ErrorRate, &view.labels, &view.values);
            }
            None => tracing::debug!("no status dimension upstream, error rate not charted"),
        }
    }

    // ── Slow cycle ──────────────────────────────────────────────

    pub async fn run_slow_cycle(&self) -> CycleOutcome {
        let Some(_ticket) = self.slow.try_enter() else {
            tracing::debug!(cycle = self.slow.name(), "previous run still in flight, skipping");
            return CycleOutcome::Skipped;
        };

        let (health, names) = tokio::join!(self.client.fetch_health(), self.client.fetch_metric_names());
        self.sink.on_health(health.as_deref());

        let rows = self.fetch_table(names).await;
        self.sink.on_table_update(&rows);
        for row in &rows {
            self.sink.on_status(&row.name, row.status);
        }

        CycleOutcome::Completed
    }

    /// One row per name, fetched concurrently under a permit budget and
    /// returned in catalog order.
    async fn fetch_table(&self, names: Vec<String>) -> Vec<MetricRow> {
        let permits = Arc::new(Semaphore::new(self.config.catalog_concurrency));
        let mut tasks = JoinSet::new();
        for (idx, name) in names.into_iter().enumerate() {
            let client = self.client.clone();
            let permits = permits.clone();
            tasks.spawn(async move {
                let _permit = permits.acquire_owned().await.ok();
                let snapshot = client.fetch_metric(&name, &[]).await;
                (idx, MetricRow::from_snapshot(&snapshot))
            });
        }

        let mut rows = Vec::with_capacity(tasks.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(row) => rows.push(row),
                Err(err) => tracing::warn!(error = %err, "metric table task failed"),
            }
        }
        rows.sort_by_key(|(idx, _)| *idx);
        rows.into_iter().map(|(_, row)| row).collect()
    }
}

fn clock_label() -> String {
    chrono::Local::now().format("%H:%M:%S").to_string()
}
