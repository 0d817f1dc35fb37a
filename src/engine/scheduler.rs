use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::cycles::{Cycle, Engine};
use super::guard::CycleOutcome;

/// Drives the fast and slow cycles on their own timers.
///
/// Each timer fires immediately once, then every period. A firing spawns
/// the cycle and moves on; the cycle's guard turns an overlapping firing
/// into a no-op, so a slow upstream lowers the effective tick rate instead
/// of piling up work.
pub struct PollingScheduler {
    engine: Arc<Engine>,
}

/// Running drivers. Dropping the handle leaves them running; call
/// [`shutdown`](Self::shutdown) to stop them.
pub struct SchedulerHandle {
    stop: watch::Sender<bool>,
    drivers: Vec<JoinHandle<()>>,
}

impl PollingScheduler {
    pub fn new(engine: Arc<Engine>) -> Self {
        Self { engine }
    }

    pub fn start(self) -> SchedulerHandle {
        let (stop, stopped) = watch::channel(false);
        let fast = self.engine.config().fast_period;
        let slow = self.engine.config().slow_period;

        tracing::info!(?fast, ?slow, "polling scheduler started");

        let drivers = vec![
            tokio::spawn(drive(self.engine.clone(), Cycle::Fast, fast, stopped.clone())),
            tokio::spawn(drive(self.engine, Cycle::Slow, slow, stopped)),
        ];
        SchedulerHandle { stop, drivers }
    }
}

impl SchedulerHandle {
    /// Stops both timers. Cycles already in flight run to completion on
    /// their own; no new ones start.
    pub async fn shutdown(self) {
        let _ = self.stop.send(true);
        for driver in self.drivers {
            if let Err(err) = driver.await {
                tracing::warn!(error = %err, "scheduler driver ended abnormally");
            }
        }
        tracing::info!("polling scheduler stopped");
    }
}

async fn drive(engine: Arc<Engine>, cycle: Cycle, period: Duration, mut stopped: watch::Receiver<bool>) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let engine = engine.clone();
                tokio::spawn(async move {
                    if engine.run(cycle).await == CycleOutcome::Skipped {
                        tracing::debug!(?cycle, "timer fired while the cycle was running");
                    }
                });
            }
            changed = stopped.changed() => {
                if changed.is_err() || *stopped.borrow() {
                    break;
                }
            }
        }
    }
}
