//! Owns the workers of at most one run at a time.
//!
//! # Lifecycle
//!
//! ```text
//!            start()                 pool closes / last worker exits
//!   idle ------------> running -------------------------------------> settled
//!    ^                    |                                              |
//!    |      stop()        |                    wait() / stop() / start() |
//!    +--------------------+----------------------------------------------+
//! ```
//!
//! A run is reaped (threads joined, summary built) by `stop`, `wait`, or by
//! the next `start` if it settled without being waited on.
//!
//! The roster lock is independent of the pool lock and is held across
//! `stop`, so a new run never overlaps the threads of the previous one.

use crate::error::SimulationError;
use crate::sampler::sample_status;
use crate::summary::RunSummary;
use boxoffice_config::Configuration;
use boxoffice_core::{
    BatchRange, CUSTOMER_BATCH, CustomerWorker, RunHandle, VENDOR_BATCH, VendorWorker,
    WorkerReport,
};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{info, warn};
use turnstile_events::{CustomerId, LogRecord, VendorId};
use turnstile_pool::{PoolConfig, PoolSnapshot, TicketPool};
use turnstile_sinks::{LedgerSink, StatusSink};

struct ActiveRun {
    run: RunHandle,
    workers: Vec<JoinHandle<WorkerReport>>,
    sampler: Option<JoinHandle<()>>,
    started: Instant,
}

#[derive(Default)]
struct Roster {
    active: Option<ActiveRun>,
    /// Pool of the most recent run, kept for `snapshot` after it is reaped.
    last_pool: Option<Arc<TicketPool>>,
}

pub struct SimulationController {
    ledger: Arc<dyn LedgerSink>,
    status: Arc<dyn StatusSink>,
    time_unit: Duration,
    sample_interval: Duration,
    seed: Option<u64>,
    vendor_batch: BatchRange,
    customer_batch: BatchRange,
    roster: Mutex<Roster>,
}

impl SimulationController {
    pub fn new(ledger: Arc<dyn LedgerSink>, status: Arc<dyn StatusSink>) -> Self {
        Self {
            ledger,
            status,
            time_unit: Duration::from_secs(1),
            sample_interval: Duration::from_secs(1),
            seed: None,
            vendor_batch: VENDOR_BATCH,
            customer_batch: CUSTOMER_BATCH,
            roster: Mutex::new(Roster::default()),
        }
    }

    /// Length of one rate step. Rates are in seconds, so a real run uses
    /// one second.
    pub fn with_time_unit(mut self, unit: Duration) -> Self {
        self.time_unit = unit;
        self
    }

    pub fn with_sample_interval(mut self, interval: Duration) -> Self {
        self.sample_interval = interval;
        self
    }

    /// Vendor `i` draws batch sizes from `seed + i`, customer `j` from
    /// `seed + vendor_count + j`.
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_batches(mut self, vendor: BatchRange, customer: BatchRange) -> Self {
        self.vendor_batch = vendor;
        self.customer_batch = customer;
        self
    }

    fn lock(&self) -> MutexGuard<'_, Roster> {
        self.roster.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Starts a run recording into the controller's ledger.
    pub fn start(&self, config: &Configuration) -> Result<(), SimulationError> {
        self.start_with_ledger(config, Arc::clone(&self.ledger))
    }

    /// Starts a run recording into `ledger`, e.g. a fresh per-run file.
    ///
    /// Fails with [`SimulationError::AlreadyRunning`] while a run is live. A
    /// run that already settled on its own is reaped first.
    pub fn start_with_ledger(
        &self,
        config: &Configuration,
        ledger: Arc<dyn LedgerSink>,
    ) -> Result<(), SimulationError> {
        let mut roster = self.lock();
        if let Some(active) = roster.active.take() {
            if !active.run.is_stopped() {
                roster.active = Some(active);
                return Err(SimulationError::AlreadyRunning);
            }
            self.reap(active, false);
        }

        self.log(LogRecord::info(format!(
            "Starting simulation with configuration: Initial Tickets={}, Max Capacity={}, Vendors={}, Customers={}",
            config.total_tickets(),
            config.max_ticket_capacity(),
            config.vendor_count(),
            config.customer_count()
        )));

        let pool = Arc::new(TicketPool::new(Arc::clone(&self.status)));
        pool.initialize(PoolConfig::new(
            config.total_tickets(),
            config.max_ticket_capacity(),
        ));
        roster.last_pool = Some(Arc::clone(&pool));

        let run = RunHandle::new(pool);
        let mut active = ActiveRun {
            run: run.clone(),
            workers: Vec::with_capacity(
                config.vendor_count() as usize + config.customer_count() as usize,
            ),
            sampler: None,
            started: Instant::now(),
        };

        if let Err(e) = self.spawn_all(config, &run, &ledger, &mut active) {
            warn!(error = %e, "aborting partially started run");
            self.reap(active, true);
            return Err(e);
        }

        info!(
            vendors = config.vendor_count(),
            customers = config.customer_count(),
            "simulation started"
        );
        self.log(LogRecord::info("Simulation started successfully"));
        roster.active = Some(active);
        Ok(())
    }

    fn spawn_all(
        &self,
        config: &Configuration,
        run: &RunHandle,
        ledger: &Arc<dyn LedgerSink>,
        active: &mut ActiveRun,
    ) -> Result<(), SimulationError> {
        // Keeps the run from settling while it is still being populated.
        let _spawning = run.enlist();
        let release_every = config.release_interval(self.time_unit);
        let retrieve_every = config.retrieval_interval(self.time_unit);

        for i in 1..=config.vendor_count() {
            let mut worker = VendorWorker::new(VendorId(i), release_every, run, Arc::clone(ledger))
                .with_batch(self.vendor_batch);
            if let Some(seed) = self.seed {
                worker = worker.with_seed(seed.wrapping_add(u64::from(i)));
            }
            let handle = thread::Builder::new()
                .name(VendorId(i).to_string())
                .spawn(move || worker.run())?;
            active.workers.push(handle);
        }

        for i in 1..=config.customer_count() {
            let mut worker =
                CustomerWorker::new(CustomerId(i), retrieve_every, run, Arc::clone(ledger))
                    .with_batch(self.customer_batch);
            if let Some(seed) = self.seed {
                let offset = u64::from(config.vendor_count()) + u64::from(i);
                worker = worker.with_seed(seed.wrapping_add(offset));
            }
            let handle = thread::Builder::new()
                .name(CustomerId(i).to_string())
                .spawn(move || worker.run())?;
            active.workers.push(handle);
        }

        let sampler_run = run.clone();
        let status = Arc::clone(&self.status);
        let interval = self.sample_interval;
        active.sampler = Some(
            thread::Builder::new()
                .name("sampler".into())
                .spawn(move || sample_status(sampler_run, status, interval))?,
        );
        Ok(())
    }

    /// Stops the active run and waits for all of its threads. `None` if
    /// nothing was running.
    pub fn stop(&self) -> Option<RunSummary> {
        let mut roster = self.lock();
        let active = roster.active.take()?;
        let stopped = !active.run.is_stopped();
        Some(self.reap(active, stopped))
    }

    /// Blocks until the active run settles by itself, then reaps it. `None`
    /// if nothing was running or another caller reaped it first.
    pub fn wait(&self) -> Option<RunSummary> {
        let run = self.lock().active.as_ref()?.run.clone();
        run.wait();

        let mut roster = self.lock();
        match roster.active.take() {
            Some(active) if active.run.same_run(&run) => Some(self.reap(active, false)),
            other => {
                roster.active = other;
                None
            }
        }
    }

    /// True while a run is live, i.e. started and not yet settled.
    pub fn is_running(&self) -> bool {
        self.lock()
            .active
            .as_ref()
            .is_some_and(|a| !a.run.is_stopped())
    }

    /// Counters of the current or most recent run's pool.
    pub fn snapshot(&self) -> Option<PoolSnapshot> {
        self.lock().last_pool.as_ref().map(|pool| pool.snapshot())
    }

    fn reap(&self, active: ActiveRun, stopped: bool) -> RunSummary {
        if stopped {
            self.log(LogRecord::info("Stopping simulation..."));
        }
        // Idempotent; a settled run still needs its pool cancelled so that
        // nothing can block in it after reaping.
        active.run.stop();

        let mut workers = Vec::with_capacity(active.workers.len());
        for handle in active.workers {
            let name = handle.thread().name().unwrap_or("worker").to_string();
            match handle.join() {
                Ok(report) => workers.push(report),
                Err(_) => warn!(worker = %name, "worker thread panicked"),
            }
        }
        if let Some(sampler) = active.sampler {
            if sampler.join().is_err() {
                warn!("status sampler panicked");
            }
        }

        // Workers deliver their notices after dropping the pool lock, so a
        // stale status can land after the closing one. Every thread is
        // joined now; this one is the last word.
        let snapshot = active.run.pool().snapshot();
        if let Err(e) = self.status.publish_status(&snapshot.status()) {
            warn!(error = %e, "final status publish failed");
        }
        let verb = if stopped { "stopped" } else { "completed" };
        info!(
            released = snapshot.released,
            sold = snapshot.sold,
            available = snapshot.available,
            "simulation {verb}"
        );
        self.log(LogRecord::info(format!(
            "Simulation {verb}. Final stats: Total tickets released={}, Remaining tickets={}, All tickets released={}, All tickets sold={}",
            snapshot.released,
            snapshot.available,
            snapshot.supply_exhausted,
            snapshot.demand_exhausted
        )));

        RunSummary {
            snapshot,
            workers,
            elapsed: active.started.elapsed(),
            stopped,
        }
    }

    fn log(&self, record: LogRecord) {
        if let Err(e) = self.status.publish_log(&record) {
            warn!(error = %e, "log publish failed");
        }
    }
}

impl Drop for SimulationController {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}
