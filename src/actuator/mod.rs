//! Read-only access to the upstream management/metrics interface.

pub mod client;
pub mod error;
pub mod model;

pub use client::MetricsClient;
pub use model::{MetricSnapshot, Statistic};
