//! Vendor loop.
//!
//! ```text
//! loop:
//!   pool closed or supply exhausted -> exit
//!   run stopped                     -> exit
//!   release(random batch)           -> refused: exit
//!   ledger.record_release           (best effort)
//!   sleep(interval)                 (cut short by stop)
//! ```

use crate::batch::{BatchRange, VENDOR_BATCH};
use crate::report::{ExitReason, WorkerId, WorkerReport};
use crate::run::{LiveGuard, RunHandle};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use turnstile_events::VendorId;
use turnstile_pool::ReleaseOutcome;
use turnstile_sinks::LedgerSink;

pub struct VendorWorker {
    id: VendorId,
    interval: Duration,
    batch: BatchRange,
    rng: StdRng,
    run: RunHandle,
    ledger: Arc<dyn LedgerSink>,
    _live: LiveGuard,
}

impl VendorWorker {
    /// Enlists the worker with `run` immediately; see [`RunHandle::enlist`].
    pub fn new(
        id: VendorId,
        interval: Duration,
        run: &RunHandle,
        ledger: Arc<dyn LedgerSink>,
    ) -> Self {
        Self {
            id,
            interval,
            batch: VENDOR_BATCH,
            rng: StdRng::from_entropy(),
            run: run.clone(),
            ledger,
            _live: run.enlist(),
        }
    }

    pub fn with_batch(mut self, batch: BatchRange) -> Self {
        self.batch = batch;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn run(mut self) -> WorkerReport {
        let mut report = WorkerReport::new(WorkerId::Vendor(self.id));

        report.exit = loop {
            let snap = self.run.pool().snapshot();
            if snap.demand_exhausted {
                break ExitReason::Closed;
            }
            if snap.supply_exhausted {
                break ExitReason::SupplyExhausted;
            }
            if self.run.is_stopped() {
                break ExitReason::Stopped;
            }

            let requested = self.batch.sample(&mut self.rng);
            match self.run.pool().release(self.id, requested) {
                ReleaseOutcome::Released { added } => {
                    report.record(added);
                    if let Err(e) = self.ledger.record_release(self.id, added) {
                        warn!(vendor = %self.id, added, error = %e, "ledger write failed");
                    }
                }
                ReleaseOutcome::SupplyExhausted => break ExitReason::SupplyExhausted,
                ReleaseOutcome::Closed => break ExitReason::Closed,
                ReleaseOutcome::Cancelled => break ExitReason::Stopped,
            }

            // An interrupted sleep falls through to the checks above.
            let _ = self.run.sleep(self.interval);
        };

        debug!(
            vendor = %self.id,
            batches = report.batches,
            tickets = report.tickets,
            exit = %report.exit,
            "vendor finished"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use turnstile_events::CustomerId;
    use turnstile_pool::{PoolConfig, TicketPool};
    use turnstile_sinks::{LedgerError, MemoryLedger, StatusRecorder};

    fn run_with(total: u32, capacity: u32) -> RunHandle {
        let pool = TicketPool::seeded(
            PoolConfig::new(total, capacity),
            Arc::new(StatusRecorder::new()),
        );
        RunHandle::new(Arc::new(pool))
    }

    #[test]
    fn releases_until_capacity_then_exits() {
        let run = run_with(0, 45);
        let ledger = Arc::new(MemoryLedger::new());
        let report = VendorWorker::new(VendorId(1), Duration::ZERO, &run, ledger.clone())
            .with_batch(BatchRange::fixed(10))
            .run();

        assert_eq!(report.exit, ExitReason::SupplyExhausted);
        assert_eq!(report.batches, 5);
        assert_eq!(report.tickets, 45);
        assert_eq!(ledger.vendor_total(VendorId(1)), 45);
        assert_eq!(run.pool().snapshot().released, 45);
        // The worker's guard was the only one.
        assert!(run.is_stopped());
    }

    #[test]
    fn fully_seeded_pool_releases_nothing() {
        let run = run_with(50, 50);
        let report = VendorWorker::new(
            VendorId(1),
            Duration::ZERO,
            &run,
            Arc::new(MemoryLedger::new()),
        )
        .run();
        assert_eq!(report.exit, ExitReason::SupplyExhausted);
        assert_eq!(report.batches, 0);
    }

    #[test]
    fn closed_pool_stops_vendor() {
        let run = run_with(20, 20);
        assert!(run.pool().purchase(CustomerId(1), 20).is_purchased());
        let report = VendorWorker::new(
            VendorId(2),
            Duration::ZERO,
            &run,
            Arc::new(MemoryLedger::new()),
        )
        .run();
        assert_eq!(report.exit, ExitReason::Closed);
    }

    struct FailingLedger;

    impl LedgerSink for FailingLedger {
        fn record_release(&self, _: VendorId, _: u32) -> Result<(), LedgerError> {
            Err(LedgerError::Poisoned)
        }

        fn record_purchase(&self, _: CustomerId, _: u32) -> Result<(), LedgerError> {
            Err(LedgerError::Poisoned)
        }
    }

    #[test]
    fn ledger_failures_do_not_stop_the_vendor() {
        let run = run_with(0, 30);
        let report = VendorWorker::new(VendorId(3), Duration::ZERO, &run, Arc::new(FailingLedger))
            .with_batch(BatchRange::fixed(10))
            .run();
        assert_eq!(report.batches, 3);
        assert_eq!(report.exit, ExitReason::SupplyExhausted);
    }

    #[test]
    fn stop_interrupts_the_interval() {
        let run = run_with(0, 1_000);
        let worker = VendorWorker::new(
            VendorId(4),
            Duration::from_secs(60),
            &run,
            Arc::new(MemoryLedger::new()),
        )
        .with_batch(BatchRange::fixed(1));
        let handle = std::thread::spawn(move || worker.run());

        std::thread::sleep(Duration::from_millis(30));
        run.stop();
        let report = handle.join().unwrap();
        assert_eq!(report.exit, ExitReason::Stopped);
        assert_eq!(report.batches, 1);
    }
}
