use crossbeam_channel::Receiver;
use std::io::{self, Write};
use std::thread::{self, JoinHandle};
use turnstile_events::{StatusEvent, TicketStatus};

/// Prints a status line to `out` whenever the pool counters change.
///
/// Log events are left to the tracing subscriber. The thread exits once
/// every sender of `events` is gone.
pub fn spawn(
    events: Receiver<StatusEvent>,
    mut out: impl Write + Send + 'static,
) -> io::Result<JoinHandle<()>> {
    thread::Builder::new().name("dashboard".into()).spawn(move || {
        let mut last: Option<TicketStatus> = None;
        for event in events {
            let StatusEvent::Status(status) = event else {
                continue;
            };
            if last == Some(status) {
                continue;
            }
            last = Some(status);
            if writeln!(out, "{}", render(&status)).is_err() {
                break;
            }
        }
    })
}

pub fn render(s: &TicketStatus) -> String {
    let mut line = format!(
        "[status] available: {:>5} | released: {:>5}",
        s.available_tickets, s.total_released
    );
    if s.supply_exhausted {
        line.push_str(" | all released");
    }
    if s.demand_exhausted {
        line.push_str(" | sold out");
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;
    use std::sync::{Arc, Mutex};
    use turnstile_events::LogRecord;

    #[derive(Clone, Default)]
    struct Shared(Arc<Mutex<Vec<u8>>>);

    impl Write for Shared {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn prints_only_changed_statuses() {
        let (tx, rx) = unbounded();
        let buf = Shared::default();
        let handle = spawn(rx, buf.clone()).unwrap();

        let a = TicketStatus {
            available_tickets: 5,
            total_released: 10,
            ..TicketStatus::default()
        };
        let b = TicketStatus {
            available_tickets: 0,
            total_released: 10,
            supply_exhausted: true,
            demand_exhausted: true,
        };
        tx.send(StatusEvent::Status(a)).unwrap();
        tx.send(StatusEvent::Status(a)).unwrap();
        tx.send(StatusEvent::Log(LogRecord::info("ignored"))).unwrap();
        tx.send(StatusEvent::Status(b)).unwrap();
        drop(tx);
        handle.join().unwrap();

        let text = String::from_utf8(buf.0.lock().unwrap().clone()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "[status] available:     5 | released:    10");
        assert!(lines[1].ends_with("| all released | sold out"));
    }
}
