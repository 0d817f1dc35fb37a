use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Installs the console subscriber. `RUST_LOG` overrides the default
/// `info` filter, e.g. `RUST_LOG=info,http.access=debug`.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(fmt::layer().with_filter(filter));
    let _ = registry.try_init();
}
