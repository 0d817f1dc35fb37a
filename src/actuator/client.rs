use std::time::Duration;

use reqwest::header::ACCEPT;
use serde::de::DeserializeOwned;

use super::error::MetricUnavailable;
use super::model::{HealthBody, MetricBody, MetricNames, MetricSnapshot};

/// Fail-soft reader for the management/metrics interface.
///
/// Every public fetch returns a value: failures are logged once at warn
/// level and folded into the empty/absent form. There are no retries, the
/// next scheduler tick is the retry.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct MetricsClient {
    http: reqwest::Client,
    base: String,
}

impl MetricsClient {
    pub fn new(base: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base: base.trim_end_matches('/').to_owned(),
        })
    }

    /// `GET {base}/metrics/{name}[?tag=k:v]*`.
    ///
    /// Without tags this is the aggregate across all dimension values plus
    /// the `availableTags` catalog; each tag narrows it to one combination.
    pub async fn fetch_metric(&self, name: &str, tags: &[(&str, &str)]) -> MetricSnapshot {
        match self.try_fetch_metric(name, tags).await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                tracing::warn!(metric = name, ?tags, path = err.path(), error = %err, "metric unavailable");
                MetricSnapshot::empty(name, tags)
            }
        }
    }

    pub async fn try_fetch_metric(
        &self,
        name: &str,
        tags: &[(&str, &str)],
    ) -> Result<MetricSnapshot, MetricUnavailable> {
        let query: Vec<(&str, String)> = tags
            .iter()
            .map(|(k, v)| ("tag", format!("{k}:{v}")))
            .collect();
        let body: MetricBody = self.get_json(&format!("/metrics/{name}"), &query).await?;
        Ok(MetricSnapshot::from_body(name, tags, body))
    }

    /// `GET {base}/metrics`; empty on failure.
    pub async fn fetch_metric_names(&self) -> Vec<String> {
        match self.get_json::<MetricNames>("/metrics", &[]).await {
            Ok(body) => body.names,
            Err(err) => {
                tracing::warn!(error = %err, "metric catalog unavailable");
                Vec::new()
            }
        }
    }

    /// `GET {base}/health`; `None` when the probe fails or carries no status.
    pub async fn fetch_health(&self) -> Option<String> {
        match self.get_json::<HealthBody>("/health", &[]).await {
            Ok(body) => body.status,
            Err(err) => {
                tracing::warn!(error = %err, "health probe unavailable");
                None
            }
        }
    }

    async fn get_json<T>(&self, path: &str, query: &[(&str, String)]) -> Result<T, MetricUnavailable>
    where
        T: DeserializeOwned + Default,
    {
        let url = format!("{}{}", self.base, path);

        let resp = self
            .http
            .get(&url)
            .query(query)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|source| MetricUnavailable::Transport {
                path: path.to_owned(),
                source,
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(MetricUnavailable::Status {
                path: path.to_owned(),
                status,
            });
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|source| MetricUnavailable::Transport {
                path: path.to_owned(),
                source,
            })?;

        // A zero-length body means "no data", same as `{}`.
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(T::default());
        }

        serde_json::from_slice(&bytes).map_err(|source| MetricUnavailable::Malformed {
            path: path.to_owned(),
            source,
        })
    }
}
