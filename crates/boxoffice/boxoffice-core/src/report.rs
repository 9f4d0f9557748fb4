use std::fmt;
use turnstile_events::{CustomerId, VendorId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkerId {
    Vendor(VendorId),
    Customer(CustomerId),
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerId::Vendor(id) => id.fmt(f),
            WorkerId::Customer(id) => id.fmt(f),
        }
    }
}

/// Why a worker left its loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// Vendor: every ticket up to capacity has been released.
    SupplyExhausted,
    /// The pool closed (sold out, or short with no supply left).
    Closed,
    /// Customer: the batch would have sold past capacity.
    WouldOvershoot,
    /// The run was stopped from outside.
    Stopped,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExitReason::SupplyExhausted => "supply exhausted",
            ExitReason::Closed => "pool closed",
            ExitReason::WouldOvershoot => "batch would overshoot capacity",
            ExitReason::Stopped => "stopped",
        })
    }
}

/// What one worker did during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerReport {
    pub worker: WorkerId,
    /// Successful release or purchase calls.
    pub batches: u32,
    /// Tickets added (vendor) or bought (customer).
    pub tickets: u64,
    pub exit: ExitReason,
}

impl WorkerReport {
    pub(crate) fn new(worker: WorkerId) -> Self {
        Self {
            worker,
            batches: 0,
            tickets: 0,
            exit: ExitReason::Stopped,
        }
    }

    #[inline]
    pub(crate) fn record(&mut self, tickets: u32) {
        self.batches += 1;
        self.tickets += u64::from(tickets);
    }

    pub fn is_vendor(&self) -> bool {
        matches!(self.worker, WorkerId::Vendor(_))
    }
}
