//! The shared ticket ledger: one monitor guarding the pool counters.
//!
//! Every vendor and customer thread goes through [`TicketPool::release`] and
//! [`TicketPool::purchase`]; nothing else mutates the counters.
//!
//! # Protocol
//!
//! **Vendor (`release`)**
//! 1. Refuse if supply or demand is already exhausted
//! 2. Clip the batch to the room left under `capacity`
//! 3. Add it, flag supply exhaustion when `released == capacity`
//! 4. Wake blocked customers
//!
//! **Customer (`purchase`)**
//! 1. Close the pool if it is sold out, or if the request cannot be met and
//!    no more supply is coming
//! 2. Refuse a batch that would sell past `capacity` (all-or-nothing)
//! 3. Wait on the condvar while supply is short and the pool is open
//! 4. Re-run 1 and 2 after every wake-up, then take the batch
//!
//! # Invariant
//!
//! After every mutation, under the lock:
//!
//! ```text
//! available + retired == released - sold
//! sold <= released <= capacity
//! ```
//!
//! `retired` is 0 until the pool closes with unsold tickets still in it.
//!
//! # Notifications
//!
//! Status snapshots and log lines produced inside the critical section are
//! buffered and handed to the [`StatusSink`] only after the lock is dropped.

use crate::config::PoolConfig;
use crate::outcome::{PurchaseOutcome, ReleaseOutcome};
use crate::snapshot::{PoolPhase, PoolSnapshot};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};
use turnstile_events::{CustomerId, LogLevel, LogRecord, TicketStatus, VendorId};
use turnstile_sinks::StatusSink;

/// Counters guarded by the pool mutex.
#[derive(Debug, Default)]
struct PoolState {
    capacity: u32,
    released: u32,
    sold: u32,
    available: u32,
    retired: u32,
    supply_exhausted: bool,
    demand_exhausted: bool,
    cancelled: bool,
    initialized: bool,
    /// Set by the first successful release or purchase after `initialize`.
    touched: bool,
}

impl PoolState {
    fn seeded(cfg: PoolConfig) -> Self {
        let seed = cfg.initial_tickets();
        Self {
            capacity: cfg.capacity,
            released: seed,
            available: seed,
            // A pool seeded to capacity has nothing left to release.
            supply_exhausted: seed == cfg.capacity,
            initialized: true,
            ..Self::default()
        }
    }

    fn status(&self) -> TicketStatus {
        TicketStatus {
            available_tickets: self.available,
            total_released: self.released,
            supply_exhausted: self.supply_exhausted,
            demand_exhausted: self.demand_exhausted,
        }
    }

    fn phase(&self) -> PoolPhase {
        if !self.initialized {
            PoolPhase::Idle
        } else if self.demand_exhausted {
            PoolPhase::Closed
        } else if self.supply_exhausted {
            PoolPhase::SupplyExhausted
        } else if self.touched {
            PoolPhase::Running
        } else {
            PoolPhase::Initialized
        }
    }

    /// Sold out, or short of `requested` with no more supply coming.
    fn is_terminal_for(&self, requested: u32) -> bool {
        self.demand_exhausted
            || self.sold >= self.capacity
            || (self.available < requested && self.supply_exhausted)
    }

    #[inline]
    fn assert_consistent(&self) {
        assert!(
            self.released <= self.capacity,
            "released {} exceeds capacity {}",
            self.released,
            self.capacity
        );
        assert!(
            self.sold <= self.released,
            "sold {} exceeds released {}",
            self.sold,
            self.released
        );
        assert_eq!(
            self.available + self.retired,
            self.released - self.sold,
            "pool counters out of balance"
        );
        assert!(
            self.retired == 0 || self.demand_exhausted,
            "tickets retired while the pool is open"
        );
    }
}

/// Status and log output collected under the lock, delivered after it.
#[derive(Default)]
struct Notices(Vec<Notice>);

enum Notice {
    Status(TicketStatus),
    Log(LogRecord),
}

impl Notices {
    fn log(&mut self, level: LogLevel, message: String) {
        self.0.push(Notice::Log(LogRecord::new(level, message)));
    }

    fn status(&mut self, status: TicketStatus) {
        self.0.push(Notice::Status(status));
    }
}

/// Result of one locked pass over a waiting purchase.
enum Pass {
    Done(PurchaseOutcome),
    Wait,
}

/// The shared, lock-protected ticket pool.
///
/// Share it between worker threads with `Arc<TicketPool>`. All operations are
/// linearizable: each runs entirely under one mutex, except that a blocked
/// `purchase` gives the mutex up while it waits on the condvar.
pub struct TicketPool {
    state: Mutex<PoolState>,
    /// Signalled whenever supply changes, the pool closes, or the run stops.
    supply: Condvar,
    status: Arc<dyn StatusSink>,
}

impl TicketPool {
    /// Creates an idle pool. Call [`TicketPool::initialize`] before use.
    pub fn new(status: Arc<dyn StatusSink>) -> Self {
        Self {
            state: Mutex::new(PoolState::default()),
            supply: Condvar::new(),
            status,
        }
    }

    /// Convenience for `new` followed by `initialize`.
    pub fn seeded(cfg: PoolConfig, status: Arc<dyn StatusSink>) -> Self {
        let pool = Self::new(status);
        pool.initialize(cfg);
        pool
    }

    /// Poisoned locks are recovered. The only panic possible while the guard
    /// is held is a failed invariant assertion.
    fn lock(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Resets the pool and seeds it with `min(total_tickets, capacity)`.
    ///
    /// Must not be called while workers are using the pool.
    pub fn initialize(&self, cfg: PoolConfig) {
        let mut notices = Notices::default();
        {
            let mut st = self.lock();
            *st = PoolState::seeded(cfg);
            st.assert_consistent();
            notices.log(
                LogLevel::Info,
                format!(
                    "Initialized ticket pool with {} tickets. Maximum capacity: {}",
                    st.available, st.capacity
                ),
            );
            notices.status(st.status());
        }
        self.deliver(notices);
    }

    /// Adds up to `requested` tickets on behalf of `vendor`.
    ///
    /// The batch is clipped to the remaining room, so the last successful
    /// release fills the pool exactly to capacity.
    pub fn release(&self, vendor: VendorId, requested: u32) -> ReleaseOutcome {
        let mut notices = Notices::default();
        let outcome = {
            let mut st = self.lock();
            self.release_locked(&mut st, vendor, requested, &mut notices)
        };
        self.deliver(notices);
        outcome
    }

    fn release_locked(
        &self,
        st: &mut PoolState,
        vendor: VendorId,
        requested: u32,
        notices: &mut Notices,
    ) -> ReleaseOutcome {
        if st.cancelled {
            return ReleaseOutcome::Cancelled;
        }
        if st.demand_exhausted {
            return ReleaseOutcome::Closed;
        }
        if st.supply_exhausted {
            return ReleaseOutcome::SupplyExhausted;
        }

        let room = st.capacity.saturating_sub(st.released);
        if room == 0 {
            st.supply_exhausted = true;
            notices.log(
                LogLevel::Info,
                "Maximum ticket capacity reached. No more tickets can be released.".into(),
            );
            // Customers short of their batch must re-check now that no more
            // supply is coming.
            self.supply.notify_all();
            return ReleaseOutcome::SupplyExhausted;
        }

        let added = requested.min(room);
        st.available += added;
        st.released += added;
        st.touched = true;

        if st.released == st.capacity {
            st.supply_exhausted = true;
            notices.log(
                LogLevel::Info,
                format!(
                    "All {} tickets have been released. Vendors will stop releasing tickets.",
                    st.capacity
                ),
            );
        }
        st.assert_consistent();

        notices.log(
            LogLevel::Info,
            format!(
                "Vendor {vendor} added {added} tickets. Pool size: {}. Total released: {}/{}",
                st.available, st.released, st.capacity
            ),
        );
        self.supply.notify_all();
        ReleaseOutcome::Released { added }
    }

    /// Takes exactly `requested` tickets on behalf of `customer`, blocking
    /// while supply is short and more is still expected.
    ///
    /// Returns without taking anything when the pool is (or becomes) closed,
    /// when the batch would sell past capacity, or when [`TicketPool::cancel`]
    /// is called while waiting.
    pub fn purchase(&self, customer: CustomerId, requested: u32) -> PurchaseOutcome {
        let mut notices = Notices::default();
        let mut announced = false;

        let outcome = loop {
            let mut st = self.lock();
            let pass = loop {
                match self.purchase_pass(&mut st, customer, requested, &mut notices) {
                    Pass::Done(outcome) => break Pass::Done(outcome),
                    Pass::Wait if !announced => break Pass::Wait,
                    Pass::Wait => {
                        st = self.supply.wait(st).unwrap_or_else(PoisonError::into_inner);
                    }
                }
            };
            drop(st);

            match pass {
                Pass::Done(outcome) => break outcome,
                Pass::Wait => {
                    // Announce the wait outside the lock, then re-check from
                    // scratch: state may have moved while the lock was free.
                    announced = true;
                    debug!(customer = %customer, requested, "customer waiting for supply");
                    self.publish_log(LogRecord::new(
                        LogLevel::Warning,
                        format!(
                            "Pool has fewer than {requested} tickets. Customer {customer} is waiting."
                        ),
                    ));
                }
            }
        };

        self.deliver(notices);
        outcome
    }

    /// One validation pass of a purchase, run under the lock.
    fn purchase_pass(
        &self,
        st: &mut PoolState,
        customer: CustomerId,
        requested: u32,
        notices: &mut Notices,
    ) -> Pass {
        if st.cancelled {
            return Pass::Done(PurchaseOutcome::Cancelled);
        }
        if st.is_terminal_for(requested) {
            if self.close(st, notices) {
                notices.status(st.status());
            }
            return Pass::Done(PurchaseOutcome::SoldOut);
        }
        if st.sold.saturating_add(requested) > st.capacity {
            return Pass::Done(PurchaseOutcome::WouldOvershoot);
        }
        if st.available < requested {
            return Pass::Wait;
        }

        st.available -= requested;
        st.sold += requested;
        st.touched = true;
        if st.sold >= st.capacity {
            self.close(st, notices);
        }
        st.assert_consistent();

        notices.log(
            LogLevel::Info,
            format!(
                "Customer {customer} purchased {requested} tickets. Pool size: {}. Total sold: {}/{}",
                st.available, st.sold, st.capacity
            ),
        );
        notices.status(st.status());
        self.supply.notify_all();
        Pass::Done(PurchaseOutcome::Purchased)
    }

    /// Moves the pool to `Closed`. Returns `false` if it already was.
    ///
    /// Unsold tickets still in the pool are retired so the run ends with
    /// nothing available.
    fn close(&self, st: &mut PoolState, notices: &mut Notices) -> bool {
        if st.demand_exhausted {
            return false;
        }
        st.demand_exhausted = true;
        st.retired = st.available;
        st.available = 0;
        st.assert_consistent();

        notices.log(
            LogLevel::Info,
            "All tickets have been sold. Stopping the system.".into(),
        );
        self.supply.notify_all();
        true
    }

    /// Stops the run: every blocked `purchase` returns
    /// [`PurchaseOutcome::Cancelled`] and later calls are refused until the
    /// next `initialize`.
    pub fn cancel(&self) {
        let mut st = self.lock();
        st.cancelled = true;
        self.supply.notify_all();
    }

    /// Consistent copy of the counters.
    pub fn snapshot(&self) -> PoolSnapshot {
        let st = self.lock();
        PoolSnapshot {
            capacity: st.capacity,
            released: st.released,
            sold: st.sold,
            available: st.available,
            retired: st.retired,
            supply_exhausted: st.supply_exhausted,
            demand_exhausted: st.demand_exhausted,
            phase: st.phase(),
        }
    }

    pub fn phase(&self) -> PoolPhase {
        self.lock().phase()
    }

    pub fn is_cancelled(&self) -> bool {
        self.lock().cancelled
    }

    fn deliver(&self, notices: Notices) {
        for notice in notices.0 {
            match notice {
                Notice::Status(status) => {
                    if let Err(e) = self.status.publish_status(&status) {
                        warn!(error = %e, "status publish failed");
                    }
                }
                Notice::Log(record) => self.publish_log(record),
            }
        }
    }

    fn publish_log(&self, record: LogRecord) {
        if let Err(e) = self.status.publish_log(&record) {
            warn!(error = %e, message = %record.message, "log publish failed");
        }
    }
}
