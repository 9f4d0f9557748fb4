pub mod ids;
pub mod log_record;
pub mod ticket_status;

pub use ids::{CustomerId, VendorId};
pub use log_record::{LogLevel, LogRecord, now_ns};
pub use ticket_status::TicketStatus;

use serde::Serialize;

/// Event pushed to status observers. One variant is sent per publish;
/// observers match on it to refresh either the ticket counters or the
/// system log view.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "topic", content = "payload", rename_all = "lowercase")]
pub enum StatusEvent {
    Status(TicketStatus),
    Log(LogRecord),
}
