mod config;
mod outcome;
mod pool;
mod signal;
mod snapshot;

pub use config::PoolConfig;
pub use outcome::{PurchaseOutcome, ReleaseOutcome};
pub use pool::TicketPool;
pub use signal::StopSignal;
pub use snapshot::{PoolPhase, PoolSnapshot};
