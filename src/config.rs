use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;
use thiserror::Error;

use crate::metrics::endpoints::{DEFAULT_MAX_PAIRS, DEFAULT_MAX_STATUS_FETCHES};
use crate::metrics::ranking::DEFAULT_TOP_N;
use crate::metrics::window::DEFAULT_CAPACITY;

#[derive(Debug, Clone, Parser)]
#[command(
    name = "actuator-pulse",
    version,
    about = "Live operational dashboard over an actuator-style metrics endpoint"
)]
pub struct Args {
    /// Base URL of the management interface (health, metrics live under it)
    #[arg(long, env = "PULSE_ACTUATOR_BASE", default_value = "http://127.0.0.1:8080/api/actuator")]
    pub base: String,

    /// Address the dashboard server binds to
    #[arg(long, env = "PULSE_LISTEN", default_value = "0.0.0.0:3000")]
    pub listen: SocketAddr,

    /// Fast cycle period: scalar charts and endpoint latency
    #[arg(long, env = "PULSE_FAST_SECS", default_value_t = 5)]
    pub fast_secs: u64,

    /// Slow cycle period: health probe and full metrics table
    #[arg(long, env = "PULSE_SLOW_SECS", default_value_t = 10)]
    pub slow_secs: u64,

    /// Per-request timeout against the management interface
    #[arg(long, env = "PULSE_TIMEOUT_MS", default_value_t = 3000)]
    pub timeout_ms: u64,

    /// Points kept per live chart
    #[arg(long, env = "PULSE_WINDOW", default_value_t = DEFAULT_CAPACITY)]
    pub window: usize,

    /// Endpoints shown in the slowest-endpoints ranking
    #[arg(long, env = "PULSE_TOP_N", default_value_t = DEFAULT_TOP_N)]
    pub top_n: usize,

    /// Upper bound on (uri, method) pairs queried per pass
    #[arg(long, env = "PULSE_MAX_PAIRS", default_value_t = DEFAULT_MAX_PAIRS)]
    pub max_pairs: usize,

    /// Upper bound on status-narrowed fetches per pass; 0 disables the drill-down
    #[arg(long, env = "PULSE_MAX_STATUS_FETCHES", default_value_t = DEFAULT_MAX_STATUS_FETCHES)]
    pub max_status_fetches: usize,

    /// Concurrent fetches while refreshing the metrics table
    #[arg(long, env = "PULSE_CATALOG_CONCURRENCY", default_value_t = 16)]
    pub catalog_concurrency: usize,

    /// Uri prefix of the management endpoints, excluded from endpoint latency
    #[arg(long, env = "PULSE_MANAGEMENT_PREFIX", default_value = "/actuator")]
    pub management_prefix: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid base url {base:?}: {reason}")]
    BadBase { base: String, reason: String },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

/// Validated engine settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub base: String,
    pub fast_period: Duration,
    pub slow_period: Duration,
    pub request_timeout: Duration,
    pub window_capacity: usize,
    pub top_n: usize,
    pub max_pairs: usize,
    pub max_status_fetches: usize,
    pub catalog_concurrency: usize,
    pub management_prefix: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base: "http://127.0.0.1:8080/api/actuator".into(),
            fast_period: Duration::from_secs(5),
            slow_period: Duration::from_secs(10),
            request_timeout: Duration::from_millis(3000),
            window_capacity: DEFAULT_CAPACITY,
            top_n: DEFAULT_TOP_N,
            max_pairs: DEFAULT_MAX_PAIRS,
            max_status_fetches: DEFAULT_MAX_STATUS_FETCHES,
            catalog_concurrency: 16,
            management_prefix: "/actuator".into(),
        }
    }
}

impl Args {
    pub fn engine_config(&self) -> Result<EngineConfig, ConfigError> {
        let config = EngineConfig {
            base: self.base.trim_end_matches('/').to_owned(),
            fast_period: Duration::from_secs(self.fast_secs),
            slow_period: Duration::from_secs(self.slow_secs),
            request_timeout: Duration::from_millis(self.timeout_ms),
            window_capacity: self.window,
            top_n: self.top_n,
            max_pairs: self.max_pairs,
            max_status_fetches: self.max_status_fetches,
            catalog_concurrency: self.catalog_concurrency,
            management_prefix: self.management_prefix.clone(),
        };
        config.validate()?;
        Ok(config)
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = reqwest::Url::parse(&self.base).map_err(|e| ConfigError::BadBase {
            base: self.base.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::BadBase {
                base: self.base.clone(),
                reason: format!("unsupported scheme {}", url.scheme()),
            });
        }

        let checks = [
            ("fast period", self.fast_period.is_zero()),
            ("slow period", self.slow_period.is_zero()),
            ("request timeout", self.request_timeout.is_zero()),
            ("window", self.window_capacity == 0),
            ("max pairs", self.max_pairs == 0),
            ("catalog concurrency", self.catalog_concurrency == 0),
        ];
        match checks.into_iter().find(|(_, zero)| *zero) {
            Some((what, _)) => Err(ConfigError::Zero(what)),
            None => Ok(()),
        }
    }
}
