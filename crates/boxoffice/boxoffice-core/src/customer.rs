//! Customer loop. Mirrors the vendor loop, except that `purchase` may block
//! inside the pool until supply arrives, the pool closes, or the run stops.

use crate::batch::{BatchRange, CUSTOMER_BATCH};
use crate::report::{ExitReason, WorkerId, WorkerReport};
use crate::run::{LiveGuard, RunHandle};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use turnstile_events::CustomerId;
use turnstile_pool::PurchaseOutcome;
use turnstile_sinks::LedgerSink;

pub struct CustomerWorker {
    id: CustomerId,
    interval: Duration,
    batch: BatchRange,
    rng: StdRng,
    run: RunHandle,
    ledger: Arc<dyn LedgerSink>,
    _live: LiveGuard,
}

impl CustomerWorker {
    /// Enlists the worker with `run` immediately; see [`RunHandle::enlist`].
    pub fn new(
        id: CustomerId,
        interval: Duration,
        run: &RunHandle,
        ledger: Arc<dyn LedgerSink>,
    ) -> Self {
        Self {
            id,
            interval,
            batch: CUSTOMER_BATCH,
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
        let mut report = WorkerReport::new(WorkerId::Customer(self.id));

        report.exit = loop {
            if self.run.pool().snapshot().demand_exhausted {
                break ExitReason::Closed;
            }
            if self.run.is_stopped() {
                break ExitReason::Stopped;
            }

            let requested = self.batch.sample(&mut self.rng);
            match self.run.pool().purchase(self.id, requested) {
                PurchaseOutcome::Purchased => {
                    report.record(requested);
                    if let Err(e) = self.ledger.record_purchase(self.id, requested) {
                        warn!(customer = %self.id, requested, error = %e, "ledger write failed");
                    }
                }
                PurchaseOutcome::SoldOut => break ExitReason::Closed,
                PurchaseOutcome::WouldOvershoot => break ExitReason::WouldOvershoot,
                PurchaseOutcome::Cancelled => break ExitReason::Stopped,
            }

            let _ = self.run.sleep(self.interval);
        };

        // Nothing more can happen in a closed pool; wake everyone else.
        if report.exit == ExitReason::Closed {
            self.run.settle();
        }

        debug!(
            customer = %self.id,
            batches = report.batches,
            tickets = report.tickets,
            exit = %report.exit,
            "customer finished"
        );
        report
    }
}
