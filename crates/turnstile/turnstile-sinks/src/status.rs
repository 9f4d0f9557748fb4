//! Push side of the system: status snapshots and log lines for observers.

use crate::error::SinkError;
use crossbeam_channel::{Receiver, Sender, unbounded};
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info, warn};
use turnstile_events::{LogLevel, LogRecord, StatusEvent, TicketStatus};

/// Fire-and-forget receiver of pool status and system log lines.
///
/// Called outside the pool lock. Implementations must not block for long:
/// publishes happen on worker threads between pool operations.
pub trait StatusSink: Send + Sync {
    fn publish_status(&self, status: &TicketStatus) -> Result<(), SinkError>;
    fn publish_log(&self, record: &LogRecord) -> Result<(), SinkError>;
}

/// Renders status and log events through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingStatusSink;

impl StatusSink for TracingStatusSink {
    fn publish_status(&self, s: &TicketStatus) -> Result<(), SinkError> {
        debug!(
            target: "turnstile::status",
            available = s.available_tickets,
            released = s.total_released,
            supply_exhausted = s.supply_exhausted,
            demand_exhausted = s.demand_exhausted,
            "ticket status"
        );
        Ok(())
    }

    fn publish_log(&self, r: &LogRecord) -> Result<(), SinkError> {
        match r.level {
            LogLevel::Debug => debug!(target: "turnstile::log", ts_ns = r.ts_ns, "{}", r.message),
            LogLevel::Info => info!(target: "turnstile::log", ts_ns = r.ts_ns, "{}", r.message),
            LogLevel::Warning => warn!(target: "turnstile::log", ts_ns = r.ts_ns, "{}", r.message),
            LogLevel::Error => error!(target: "turnstile::log", ts_ns = r.ts_ns, "{}", r.message),
        }
        Ok(())
    }
}

/// Broadcasts every event to all live subscribers.
///
/// Each subscriber gets its own unbounded channel, so a slow observer never
/// stalls a publishing worker. Subscribers that dropped their receiver are
/// pruned on the next publish.
#[derive(Debug, Default)]
pub struct StatusBroadcaster {
    subscribers: Mutex<Vec<Sender<StatusEvent>>>,
}

impl StatusBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> Receiver<StatusEvent> {
        let (tx, rx) = unbounded();
        self.lock().push(tx);
        rx
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Sender<StatusEvent>>> {
        match self.subscribers.lock() {
            Ok(guard) => guard,
            Err(poison) => poison.into_inner(),
        }
    }

    fn broadcast(&self, event: StatusEvent) -> Result<(), SinkError> {
        let mut subs = self.lock();
        subs.retain(|tx| tx.send(event.clone()).is_ok());
        Ok(())
    }
}

impl StatusSink for StatusBroadcaster {
    fn publish_status(&self, status: &TicketStatus) -> Result<(), SinkError> {
        self.broadcast(StatusEvent::Status(*status))
    }

    fn publish_log(&self, record: &LogRecord) -> Result<(), SinkError> {
        self.broadcast(StatusEvent::Log(record.clone()))
    }
}

/// Keeps every event it receives, in order.
#[derive(Debug, Default)]
pub struct StatusRecorder {
    events: Mutex<Vec<StatusEvent>>,
}

impl StatusRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<StatusEvent> {
        match self.events.lock() {
            Ok(ev) => ev.clone(),
            Err(poison) => poison.into_inner().clone(),
        }
    }

    pub fn statuses(&self) -> Vec<TicketStatus> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                StatusEvent::Status(s) => Some(s),
                StatusEvent::Log(_) => None,
            })
            .collect()
    }

    pub fn logs(&self) -> Vec<LogRecord> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                StatusEvent::Log(r) => Some(r),
                StatusEvent::Status(_) => None,
            })
            .collect()
    }

    fn push(&self, event: StatusEvent) {
        match self.events.lock() {
            Ok(mut ev) => ev.push(event),
            Err(poison) => poison.into_inner().push(event),
        }
    }
}

impl StatusSink for StatusRecorder {
    fn publish_status(&self, status: &TicketStatus) -> Result<(), SinkError> {
        self.push(StatusEvent::Status(*status));
        Ok(())
    }

    fn publish_log(&self, record: &LogRecord) -> Result<(), SinkError> {
        self.push(StatusEvent::Log(record.clone()));
        Ok(())
    }
}

/// Forwards each event to several sinks.
///
/// Every sink sees every event; the first failure is reported after all
/// sinks have been tried.
#[derive(Default, Clone)]
pub struct FanoutSink {
    sinks: Vec<Arc<dyn StatusSink>>,
}

impl FanoutSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: Arc<dyn StatusSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    fn each(&self, f: impl Fn(&dyn StatusSink) -> Result<(), SinkError>) -> Result<(), SinkError> {
        let mut first_err = None;
        for sink in &self.sinks {
            if let Err(e) = f(sink.as_ref()) {
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }
}

impl StatusSink for FanoutSink {
    fn publish_status(&self, status: &TicketStatus) -> Result<(), SinkError> {
        self.each(|s| s.publish_status(status))
    }

    fn publish_log(&self, record: &LogRecord) -> Result<(), SinkError> {
        self.each(|s| s.publish_log(record))
    }
}
