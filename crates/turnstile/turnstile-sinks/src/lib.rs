//! Boundary contracts between the ticket pool and the outside world.
//!
//! The pool and its workers only ever talk to two collaborators:
//! - a [`LedgerSink`] that accumulates per-vendor / per-customer totals
//! - a [`StatusSink`] that receives status snapshots and system log lines
//!
//! Both are best-effort. Callers log a failed write and carry on; nothing here
//! is allowed to abort a run.

mod error;
mod ledger;
mod status;

pub use error::{LedgerError, SinkError};
pub use ledger::{JsonFileLedger, LedgerSink, LedgerTotals, MemoryLedger};
pub use status::{FanoutSink, StatusBroadcaster, StatusRecorder, StatusSink, TracingStatusSink};
