//! Derivations from raw actuator snapshots: chart series, rates, endpoint
//! latency breakdowns, ranking and the metrics table.

pub mod catalog;
pub mod endpoints;
pub mod ranking;
pub mod scalars;
pub mod status;
pub mod window;

pub use endpoints::{
    EndpointLatencyAggregator, EndpointLatencyRecord, EndpointLatencyReport, StatusBreakdown,
};
pub use scalars::RateState;
pub use status::{MetricRow, MetricStatus};
pub use window::{SeriesView, SlidingWindowSeries};
