use super::endpoints::EndpointLatencyRecord;

pub const DEFAULT_TOP_N: usize = 5;

/// Slowest `n` endpoints by average latency, highest first.
///
/// The sort is stable, so equal latencies keep their discovery order.
pub fn top_n(records: &[EndpointLatencyRecord], n: usize) -> Vec<EndpointLatencyRecord> {
    let mut ranked = records.to_vec();
    ranked.sort_by(|a, b| b.avg_latency_ms.total_cmp(&a.avg_latency_ms));
    ranked.truncate(n);
    ranked
}
