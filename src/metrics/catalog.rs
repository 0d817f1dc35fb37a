use serde::Serialize;

/// Display unit attached to a known metric name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricUnit {
    Bytes,
    Ms,
    Seconds,
    Percent,
    Count,
    Raw,
}

/// Static display annotation for one metric name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricDescriptor {
    pub name: &'static str,
    pub unit: MetricUnit,
    pub description: &'static str,
}

const UNKNOWN_DESCRIPTION: &str = "----";

use MetricUnit::*;

#[rustfmt::skip]
const DESCRIPTORS: &[(&str, &str, MetricUnit)] = &[
    ("application.ready.time",               "Time to be ready",            Ms),
    ("application.started.time",             "Time to start app",           Ms),
    ("disk.free",                            "Free disk space",             Bytes),
    ("disk.total",                           "Total disk space",            Bytes),
    ("executor.active",                      "Active executor threads",     Count),
    ("executor.completed",                   "Completed executor tasks",    Count),
    ("executor.pool.core",                   "Core pool size",              Count),
    ("executor.pool.max",                    "Max pool size",               Count),
    ("executor.pool.size",                   "Current pool size",           Count),
    ("executor.queue.remaining",             "Remaining queue capacity",    Count),
    ("executor.queued",                      "Queued tasks",                Count),
    ("hikaricp.connections",                 "Connections (HikariCP)",      Count),
    ("hikaricp.connections.acquire",         "Connection acquire time",     Ms),
    ("hikaricp.connections.active",          "Active connections",          Count),
    ("hikaricp.connections.creation",        "Connection creation time",    Ms),
    ("hikaricp.connections.idle",            "Idle connections",            Count),
    ("hikaricp.connections.max",             "Max connections allowed",     Count),
    ("hikaricp.connections.min",             "Min connections allowed",     Count),
    ("hikaricp.connections.pending",         "Pending connections",         Count),
    ("hikaricp.connections.timeout",         "Connection timeout",          Ms),
    ("hikaricp.connections.usage",           "Connection usage time",       Ms),
    ("http.server.requests",                 "HTTP requests",               Count),
    ("http.server.requests.active",          "Active HTTP requests",        Count),
    ("jdbc.connections.active",              "Active JDBC connections",     Count),
    ("jdbc.connections.idle",                "Idle JDBC connections",       Count),
    ("jdbc.connections.max",                 "Max JDBC connections",        Count),
    ("jdbc.connections.min",                 "Min JDBC connections",        Count),
    ("jvm.buffer.count",                     "Number of buffers",           Count),
    ("jvm.buffer.memory.used",               "Buffer memory used",          Bytes),
    ("jvm.buffer.total.capacity",            "Buffer total capacity",       Bytes),
    ("jvm.classes.loaded",                   "Loaded classes",              Count),
    ("jvm.classes.unloaded",                 "Unloaded classes",            Count),
    ("jvm.compilation.time",                 "JIT compilation time",        Ms),
    ("jvm.gc.concurrent.phase.time",         "GC concurrent phase time",    Ms),
    ("jvm.gc.live.data.size",                "Live data size after GC",     Bytes),
    ("jvm.gc.max.data.size",                 "Max GC data size",            Bytes),
    ("jvm.gc.memory.allocated",              "Memory allocated",            Bytes),
    ("jvm.gc.memory.promoted",               "Memory promoted",             Bytes),
    ("jvm.gc.overhead",                      "GC overhead time",            Percent),
    ("jvm.gc.pause",                         "GC pause time",               Ms),
    ("jvm.memory.committed",                 "Committed memory",            Bytes),
    ("jvm.memory.max",                       "Max memory",                  Bytes),
    ("jvm.memory.usage.after.gc",            "Memory usage after GC",       Bytes),
    ("jvm.memory.used",                      "Used memory",                 Bytes),
    ("jvm.threads.daemon",                   "Daemon threads",              Count),
    ("jvm.threads.live",                     "Live threads",                Count),
    ("jvm.threads.peak",                     "Peak threads",                Count),
    ("jvm.threads.started",                  "Started threads",             Count),
    ("jvm.threads.states",                   "Thread states",               Count),
    ("logback.events",                       "Logback events",              Count),
    ("process.cpu.time",                     "Process CPU time",            Seconds),
    ("process.cpu.usage",                    "Process CPU usage",           Percent),
    ("process.start.time",                   "Process start time",          Seconds),
    ("process.uptime",                       "Process uptime",              Seconds),
    ("spring.data.repository.invocations",   "Repository method calls",     Count),
    ("spring.security.authorizations",       "Authorizations",              Count),
    ("spring.security.authorizations.active","Active authorizations",       Count),
    ("spring.security.filterchains",         "Security filter chains",      Count),
    ("system.cpu.count",                     "Available CPU cores",         Count),
    ("system.cpu.usage",                     "System CPU usage",            Percent),
    ("tomcat.sessions.active.current",       "Active sessions",             Count),
    ("tomcat.sessions.active.max",           "Max active sessions",         Count),
    ("tomcat.sessions.alive.max",            "Max alive sessions",          Count),
    ("tomcat.sessions.created",              "Sessions created",            Count),
    ("tomcat.sessions.expired",              "Sessions expired",            Count),
    ("tomcat.sessions.rejected",             "Sessions rejected",           Count),
];

/// Known annotation for `name`, if any.
pub fn lookup(name: &str) -> Option<MetricDescriptor> {
    DESCRIPTORS
        .iter()
        .find(|(n, _, _)| *n == name)
        .map(|&(name, description, unit)| MetricDescriptor {
            name,
            unit,
            description,
        })
}

/// Description and unit for a table row; unknown names get a placeholder.
pub fn describe(name: &str) -> (&'static str, MetricUnit) {
    lookup(name)
        .map(|d| (d.description, d.unit))
        .unwrap_or((UNKNOWN_DESCRIPTION, Raw))
}

impl MetricUnit {
    /// Human-readable rendering used by the metrics table.
    pub fn format(self, value: f64) -> String {
        match self {
            Bytes if value > 1e9 => format!("{:.2} GB", value / 1e9),
            Bytes if value > 1e6 => format!("{:.2} MB", value / 1e6),
            Bytes if value > 1e3 => format!("{:.2} KB", value / 1e3),
            Bytes => format!("{value} B"),
            Ms => format!("{value:.2} ms"),
            Seconds => format!("{value:.2} s"),
            Percent => format!("{:.1}%", value * 100.0),
            Count => format!("{value:.0}"),
            Raw => format!("{value:.2}"),
        }
    }
}

/// `"N/A"` for an absent value, otherwise the unit's rendering.
pub fn format_value(value: Option<f64>, unit: MetricUnit) -> String {
    match value {
        Some(v) => unit.format(v),
        None => "N/A".to_owned(),
    }
}
