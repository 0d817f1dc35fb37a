//! Polling, derivation and publication: the part of the dashboard that
//! owns state between ticks.

pub mod cycles;
pub mod guard;
pub mod scheduler;
pub mod sink;
pub mod state;

pub use cycles::{Engine, RefreshOutcome};
pub use scheduler::PollingScheduler;
pub use sink::{ReportingSink, SeriesId};
