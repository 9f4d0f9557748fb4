use boxoffice_core::{ExitReason, WorkerReport};
use std::time::Duration;
use turnstile_pool::PoolSnapshot;

/// Outcome of one run, produced when the controller reaps it.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Pool counters after every worker has exited.
    pub snapshot: PoolSnapshot,
    pub workers: Vec<WorkerReport>,
    pub elapsed: Duration,
    /// `true` when ended by `stop`, `false` when the run settled by itself.
    pub stopped: bool,
}

impl RunSummary {
    pub fn vendors(&self) -> impl Iterator<Item = &WorkerReport> {
        self.workers.iter().filter(|r| r.is_vendor())
    }

    pub fn customers(&self) -> impl Iterator<Item = &WorkerReport> {
        self.workers.iter().filter(|r| !r.is_vendor())
    }

    /// Tickets added by vendors, excluding the initial batch.
    pub fn tickets_released_by_vendors(&self) -> u64 {
        self.vendors().map(|r| r.tickets).sum()
    }

    pub fn tickets_bought(&self) -> u64 {
        self.customers().map(|r| r.tickets).sum()
    }

    pub fn exits(&self, reason: ExitReason) -> usize {
        self.workers.iter().filter(|r| r.exit == reason).count()
    }
}
