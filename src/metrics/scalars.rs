use tokio::time::Instant;

use crate::actuator::{MetricSnapshot, Statistic};

use super::endpoints::{as_count, avg_latency_ms};

pub const SYSTEM_CPU_USAGE: &str = "system.cpu.usage";
pub const JVM_MEMORY_USED: &str = "jvm.memory.used";

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// CPU gauge (a 0..1 fraction) as a percentage.
pub fn cpu_percent(snapshot: &MetricSnapshot) -> Option<f64> {
    snapshot.first_value().map(|v| v * 100.0)
}

/// Memory gauge (bytes) in megabytes.
pub fn memory_mb(snapshot: &MetricSnapshot) -> Option<f64> {
    snapshot.first_value().map(|v| v / BYTES_PER_MB)
}

/// Average request latency over the whole cumulative window.
pub fn cumulative_latency_ms(snapshot: &MetricSnapshot) -> Option<f64> {
    if !snapshot.has_data() {
        return None;
    }
    let count = as_count(snapshot.statistic_or_zero(Statistic::Count));
    Some(avg_latency_ms(count, snapshot.statistic_or_zero(Statistic::TotalTime)))
}

/// Turns the monotonic request COUNT into a per-second rate by successive
/// differencing. Lives as long as the engine.
///
/// The divisor is the time actually elapsed since the previous observation,
/// so off-schedule runs (manual refresh, a late or skipped tick) still chart
/// the true rate.
#[derive(Debug, Clone, Default)]
pub struct RateState {
    last: Option<(u64, Instant)>,
}

impl RateState {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn last_cumulative(&self) -> u64 {
        self.last.map(|(count, _)| count).unwrap_or(0)
    }

    /// Records `current` seen `at` as the new baseline and returns the rate
    /// since the previous one. The first observation has no baseline and
    /// yields 0; a counter that went backwards (upstream restart) also
    /// yields 0, as does a zero elapsed time.
    pub fn observe(&mut self, current: u64, at: Instant) -> f64 {
        let rate = match self.last {
            Some((last, then)) => {
                let elapsed = at.saturating_duration_since(then).as_secs_f64();
                if elapsed > 0.0 {
                    current.saturating_sub(last) as f64 / elapsed
                } else {
                    0.0
                }
            }
            None => 0.0,
        };
        self.last = Some((current, at));
        rate
    }

    /// Same as [`observe`](Self::observe), reading COUNT from the aggregate
    /// request timer. `None` (and no state change) when the fetch had no data.
    pub fn observe_snapshot(&mut self, snapshot: &MetricSnapshot, at: Instant) -> Option<f64> {
        if !snapshot.has_data() {
            return None;
        }
        let current = as_count(snapshot.statistic_or_zero(Statistic::Count));
        Some(self.observe(current, at))
    }
}
