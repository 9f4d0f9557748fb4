mod batch;
mod customer;
mod report;
mod run;
mod vendor;

pub use batch::{BatchRange, CUSTOMER_BATCH, VENDOR_BATCH};
pub use customer::CustomerWorker;
pub use report::{ExitReason, WorkerId, WorkerReport};
pub use run::{LiveGuard, RunHandle};
pub use vendor::VendorWorker;
