use std::sync::Arc;

use clap::Parser;
use thiserror::Error;

mod actuator;
mod config;
mod dashboard;
mod engine;
mod metrics;
mod middleware;
mod telemetry;

#[cfg(test)]
mod testutil;

use actuator::MetricsClient;
use config::{Args, ConfigError};
use dashboard::{AppState, DashboardSink};
use engine::{Engine, PollingScheduler};

#[derive(Debug, Error)]
enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to build http client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("failed to bind or serve: {0}")]
    Io(#[from] std::io::Error),
}

#[tokio::main]
async fn main() -> Result<(), StartupError> {
    telemetry::init();
    let args = Args::parse();

    println!();
    println!("╔══════════════════════════════════════════════════╗");
    println!("║   📈  ACTUATOR PULSE                             ║");
    println!("╚══════════════════════════════════════════════════╝");
    println!();

    // ── 1. Settings ──────────────────────────────────────────────
    let config = args.engine_config()?;
    println!("🔌 Polling {}", config.base);
    println!(
        "   fast every {:?}, slow every {:?}",
        config.fast_period, config.slow_period
    );

    // ── 2. Engine ────────────────────────────────────────────────
    let client = MetricsClient::new(&config.base, config.request_timeout)?;
    let sink = Arc::new(DashboardSink::new());
    let engine = Arc::new(Engine::new(client, config, sink.clone()));

    // ── 3. Timers ────────────────────────────────────────────────
    let scheduler = PollingScheduler::new(engine.clone()).start();

    // ── 4. Build Axum router ─────────────────────────────────────
    let app = dashboard::server::create_router(Arc::new(AppState { engine, sink }));

    // ── 5. Bind & serve ──────────────────────────────────────────
    let listener = tokio::net::TcpListener::bind(args.listen).await?;
    let addr = listener.local_addr()?;

    println!();
    println!("Server listening on http://{addr}");
    println!("Dashboard JSON  → http://{addr}/api/dashboard");
    println!("Dashboard SSE   → http://{addr}/api/dashboard/stream");
    println!("Refresh         → POST http://{addr}/api/refresh");
    println!();

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown requested");
        })
        .await?;

    scheduler.shutdown().await;
    Ok(())
}
