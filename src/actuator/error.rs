use thiserror::Error;

/// Why a fetch against the management interface produced no data.
///
/// Transport and upstream failures are kept apart only for the log line;
/// callers of `MetricsClient::fetch_*` never see this type.
#[derive(Debug, Error)]
pub enum MetricUnavailable {
    #[error("transport failure on {path}: {source}")]
    Transport {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("upstream answered {status} on {path}")]
    Status {
        path: String,
        status: reqwest::StatusCode,
    },

    #[error("malformed body on {path}: {source}")]
    Malformed {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl MetricUnavailable {
    pub fn path(&self) -> &str {
        match self {
            Self::Transport { path, .. } | Self::Status { path, .. } | Self::Malformed { path, .. } => {
                path
            }
        }
    }
}
