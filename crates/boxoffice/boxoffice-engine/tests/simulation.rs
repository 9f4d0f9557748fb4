//! Full runs of the controller with millisecond pacing.
//!
//! ```bash
//! cargo test -p boxoffice-engine --test simulation
//! ```

use boxoffice_config::Configuration;
use boxoffice_core::{BatchRange, ExitReason, VENDOR_BATCH, WorkerId};
use boxoffice_engine::{SimulationController, SimulationError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use turnstile_events::{CustomerId, LogLevel, LogRecord, TicketStatus};
use turnstile_pool::PoolPhase;
use turnstile_sinks::{LedgerSink, MemoryLedger, SinkError, StatusRecorder, StatusSink};

const UNIT: Duration = Duration::from_millis(1);

struct Harness {
    controller: SimulationController,
    ledger: Arc<MemoryLedger>,
    recorder: Arc<StatusRecorder>,
}

fn harness(customer_batch: BatchRange) -> Harness {
    let ledger = Arc::new(MemoryLedger::new());
    let recorder = Arc::new(StatusRecorder::new());
    let controller = SimulationController::new(
        Arc::clone(&ledger) as Arc<dyn LedgerSink>,
        Arc::clone(&recorder) as Arc<dyn StatusSink>,
    )
    .with_time_unit(UNIT)
    .with_sample_interval(Duration::from_millis(5))
    .with_seed(Some(42))
    .with_batches(VENDOR_BATCH, customer_batch);
    Harness {
        controller,
        ledger,
        recorder,
    }
}

#[test]
fn fully_seeded_pool_sells_out_in_ten_batches() {
    let h = harness(BatchRange::fixed(5));
    let cfg = Configuration::new(50, 50, 1, 1, 1, 1).unwrap();

    h.controller.start(&cfg).unwrap();
    let summary = h.controller.wait().expect("run was active");

    assert!(!summary.stopped);
    assert_eq!(summary.snapshot.phase, PoolPhase::Closed);
    assert_eq!(summary.snapshot.available, 0);
    assert_eq!(summary.snapshot.sold, 50);
    assert!(summary.snapshot.demand_exhausted);

    let customer = summary.customers().next().unwrap();
    assert_eq!(customer.worker, WorkerId::Customer(CustomerId(1)));
    assert_eq!(customer.batches, 10);
    assert_eq!(customer.exit, ExitReason::Closed);

    // Supply was exhausted before the vendor ever ran.
    let vendor = summary.vendors().next().unwrap();
    assert_eq!(vendor.batches, 0);
    assert!(matches!(
        vendor.exit,
        ExitReason::SupplyExhausted | ExitReason::Closed
    ));

    assert_eq!(h.ledger.customer_total(CustomerId(1)), 50);
    assert_eq!(h.ledger.totals().total_released(), 0);
    assert!(!h.controller.is_running());
}

#[test]
fn many_workers_keep_the_books_balanced() {
    let h = harness(BatchRange::new(1, 5));
    let cfg = Configuration::new(10, 200, 1, 1, 4, 6).unwrap();

    h.controller.start(&cfg).unwrap();
    let summary = h.controller.wait().expect("run was active");
    let snap = summary.snapshot;

    assert_eq!(summary.workers.len(), 10);
    assert_eq!(snap.released, 200);
    assert!(snap.supply_exhausted);
    assert_eq!(snap.available + snap.retired, snap.released - snap.sold);
    assert_eq!(summary.tickets_released_by_vendors(), 190);
    assert_eq!(summary.tickets_bought(), u64::from(snap.sold));

    let totals = h.ledger.totals();
    assert_eq!(totals.total_released(), 190);
    assert_eq!(totals.total_bought(), u64::from(snap.sold));
}

#[test]
fn second_start_is_rejected_while_running() {
    let h = harness(BatchRange::fixed(5));
    // Slow pacing keeps the first run alive.
    let controller = h.controller.with_time_unit(Duration::from_secs(1));
    let cfg = Configuration::new(1, 10_000, 10, 10, 2, 2).unwrap();

    controller.start(&cfg).unwrap();
    assert!(controller.is_running());
    assert!(matches!(
        controller.start(&cfg),
        Err(SimulationError::AlreadyRunning)
    ));

    let summary = controller.stop().expect("run was active");
    assert!(summary.stopped);
    assert!(!controller.is_running());
    assert!(controller.stop().is_none());

    // A stopped controller can run again.
    controller.start(&cfg).unwrap();
    assert!(controller.stop().is_some());
}

#[test]
fn stop_wakes_blocked_customers_promptly() {
    let h = harness(BatchRange::fixed(50));
    let controller = h
        .controller
        .with_time_unit(Duration::from_secs(1))
        .with_batches(BatchRange::fixed(1), BatchRange::fixed(50));
    let cfg = Configuration::new(1, 1_000, 10, 10, 1, 3).unwrap();

    controller.start(&cfg).unwrap();
    std::thread::sleep(Duration::from_millis(50));

    let started = Instant::now();
    let summary = controller.stop().expect("run was active");
    assert!(started.elapsed() < Duration::from_secs(5));

    assert_eq!(summary.exits(ExitReason::Stopped), 4);
    assert_eq!(summary.tickets_bought(), 0);
    assert_eq!(summary.snapshot.phase, PoolPhase::Running);
}

#[test]
fn settled_run_is_reaped_by_next_start() {
    let h = harness(BatchRange::fixed(5));
    let cfg = Configuration::new(20, 20, 1, 1, 1, 2).unwrap();

    h.controller.start(&cfg).unwrap();
    let deadline = Instant::now() + Duration::from_secs(10);
    while h.controller.is_running() {
        assert!(Instant::now() < deadline, "run never settled");
        std::thread::sleep(Duration::from_millis(2));
    }

    h.controller.start(&cfg).unwrap();
    let summary = h.controller.wait().expect("second run was active");
    assert_eq!(summary.snapshot.sold, 20);
    assert_eq!(h.ledger.totals().total_bought(), 40);
}

#[test]
fn observers_see_start_status_and_final_stats() {
    let h = harness(BatchRange::fixed(5));
    let cfg = Configuration::new(25, 25, 1, 1, 1, 1).unwrap();

    h.controller.start(&cfg).unwrap();
    h.controller.wait().unwrap();

    let logs = h.recorder.logs();
    let messages: Vec<&str> = logs.iter().map(|l| l.message.as_str()).collect();
    assert!(messages[0].starts_with("Starting simulation with configuration: Initial Tickets=25"));
    assert!(messages.contains(&"Simulation started successfully"));
    assert!(messages.contains(&"All tickets have been sold. Stopping the system."));
    let last = messages.last().unwrap();
    assert!(last.starts_with("Simulation completed. Final stats: Total tickets released=25"));
    assert!(logs.iter().all(|l| l.level != LogLevel::Error));

    let statuses = h.recorder.statuses();
    let final_status = statuses.last().unwrap();
    assert!(final_status.demand_exhausted);
    assert_eq!(final_status.available_tickets, 0);

    assert_eq!(h.controller.snapshot().unwrap().sold, 25);
}

/// Holds back open-pool statuses published from customer threads.
struct LaggingObserver {
    inner: Arc<StatusRecorder>,
    lag: Duration,
}

impl StatusSink for LaggingObserver {
    fn publish_status(&self, status: &TicketStatus) -> Result<(), SinkError> {
        let on_customer = thread::current()
            .name()
            .is_some_and(|name| name.starts_with('C'));
        if on_customer && !status.demand_exhausted {
            thread::sleep(self.lag);
        }
        self.inner.publish_status(status)
    }

    fn publish_log(&self, record: &LogRecord) -> Result<(), SinkError> {
        self.inner.publish_log(record)
    }
}

#[test]
fn final_status_reflects_closed_pool_despite_slow_observer() {
    let recorder = Arc::new(StatusRecorder::new());
    let observer = LaggingObserver {
        inner: Arc::clone(&recorder),
        lag: Duration::from_millis(200),
    };
    let controller = SimulationController::new(
        Arc::new(MemoryLedger::new()) as Arc<dyn LedgerSink>,
        Arc::new(observer) as Arc<dyn StatusSink>,
    )
    .with_time_unit(UNIT)
    .with_sample_interval(Duration::from_millis(5))
    .with_seed(Some(42))
    .with_batches(VENDOR_BATCH, BatchRange::fixed(5));
    let cfg = Configuration::new(10, 10, 1, 1, 1, 2).unwrap();

    controller.start(&cfg).unwrap();
    let summary = controller.wait().expect("run was active");
    assert_eq!(summary.snapshot.phase, PoolPhase::Closed);

    let statuses = recorder.statuses();
    let last = statuses.last().unwrap();
    assert!(last.demand_exhausted);
    assert_eq!(last.available_tickets, 0);
}
