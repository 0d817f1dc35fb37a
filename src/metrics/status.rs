use serde::Serialize;

use crate::actuator::MetricSnapshot;

use super::catalog::{self, MetricUnit};

/// Badge shown next to a metric. There is no threshold source, so the only
/// distinction is whether a measurement came back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricStatus {
    Ok,
    Unknown,
}

impl MetricStatus {
    pub fn classify(snapshot: &MetricSnapshot) -> Self {
        if snapshot.has_data() {
            Self::Ok
        } else {
            Self::Unknown
        }
    }

    pub fn badge(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Unknown => "N/A",
        }
    }
}

/// One line of the metrics table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricRow {
    pub name: String,
    pub value: Option<f64>,
    pub display: String,
    pub description: &'static str,
    pub unit: MetricUnit,
    pub status: MetricStatus,
    /// Badge text, `OK` or `N/A`.
    pub badge: &'static str,
}

impl MetricRow {
    pub fn from_snapshot(snapshot: &MetricSnapshot) -> Self {
        let (description, unit) = catalog::describe(&snapshot.name);
        let value = snapshot.first_value();
        let status = MetricStatus::classify(snapshot);
        Self {
            name: snapshot.name.clone(),
            value,
            display: catalog::format_value(value, unit),
            description,
            unit,
            status,
            badge: status.badge(),
        }
    }
}

/// Case-insensitive substring match on the metric name; a blank query keeps
/// every row.
pub fn filter_rows<'a>(rows: &'a [MetricRow], query: &str) -> Vec<&'a MetricRow> {
    let needle = query.trim().to_lowercase();
    rows.iter()
        .filter(|row| needle.is_empty() || row.name.to_lowercase().contains(&needle))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actuator::model::{MeasurementSample, MetricBody};
    use crate::actuator::Statistic;

    fn row(name: &str, value: Option<f64>) -> MetricRow {
        let measurements = value
            .map(|value| vec![MeasurementSample { statistic: Statistic::Value, value }])
            .unwrap_or_default();
        let body = MetricBody {
            measurements,
            available_tags: Vec::new(),
        };
        MetricRow::from_snapshot(&MetricSnapshot::from_body(name, &[], body))
    }

    #[test]
    fn measured_rows_are_ok_and_formatted() {
        let r = row("system.cpu.usage", Some(0.5));
        assert_eq!(r.status, MetricStatus::Ok);
        assert_eq!(r.display, "50.0%");
        assert_eq!(r.description, "System CPU usage");
        assert_eq!(r.badge, "OK");
    }

    #[test]
    fn missing_rows_are_unknown_and_na() {
        let r = row("jvm.memory.used", None);
        assert_eq!(r.status, MetricStatus::Unknown);
        assert_eq!(r.display, "N/A");
        assert_eq!(r.value, None);
        assert_eq!(r.badge, "N/A");
    }

    #[test]
    fn search_is_case_insensitive() {
        let rows = vec![row("jvm.memory.used", None), row("system.cpu.usage", None), row("JVM.threads.live", None)];
        let hits: Vec<&str> = filter_rows(&rows, " jvm ").iter().map(|r| r.name.as_str()).collect();
        assert_eq!(hits, ["jvm.memory.used", "JVM.threads.live"]);
        assert_eq!(filter_rows(&rows, "").len(), 3);
        assert!(filter_rows(&rows, "tomcat").is_empty());
    }
}
