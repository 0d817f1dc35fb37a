use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;

/// What happened when a cycle was asked to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CycleOutcome {
    Completed,
    /// The previous invocation was still in flight; this one did nothing.
    Skipped,
}

/// At-most-one-active-invocation flag for one cycle kind.
///
/// A firing that finds the cycle running is dropped, never queued.
#[derive(Debug)]
pub struct CycleGuard {
    name: &'static str,
    running: AtomicBool,
}

/// Held for the duration of one invocation; releases the guard on drop,
/// including when the invocation's future is cancelled.
#[must_use = "the guard is released as soon as the ticket is dropped"]
#[derive(Debug)]
pub struct CycleTicket<'a> {
    guard: &'a CycleGuard,
}

impl CycleGuard {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            running: AtomicBool::new(false),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn try_enter(&self) -> Option<CycleTicket<'_>> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| CycleTicket { guard: self })
    }

    #[cfg(test)]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

impl Drop for CycleTicket<'_> {
    fn drop(&mut self) {
        self.guard.running.store(false, Ordering::Release);
    }
}
