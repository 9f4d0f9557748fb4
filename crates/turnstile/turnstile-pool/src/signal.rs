//! One-shot stop flag that sleeping threads can wait on.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// A latch that flips from "running" to "stopped" exactly once.
///
/// Workers pace themselves with [`StopSignal::sleep`], which returns early
/// the moment the signal is triggered, so a stop never waits out a full
/// release or retrieval interval.
#[derive(Debug, Default)]
pub struct StopSignal {
    stopped: Mutex<bool>,
    cv: Condvar,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, bool> {
        self.stopped.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Flips the latch and wakes every sleeper. Idempotent.
    pub fn trigger(&self) {
        let mut stopped = self.lock();
        *stopped = true;
        self.cv.notify_all();
    }

    pub fn is_triggered(&self) -> bool {
        *self.lock()
    }

    /// Sleeps for `interval` unless stopped first.
    ///
    /// Returns `true` if the full interval elapsed, `false` if the signal was
    /// (or already had been) triggered.
    pub fn sleep(&self, interval: Duration) -> bool {
        let guard = self.lock();
        let (stopped, _) = self
            .cv
            .wait_timeout_while(guard, interval, |stopped| !*stopped)
            .unwrap_or_else(PoisonError::into_inner);
        !*stopped
    }

    /// Blocks until the signal is triggered.
    pub fn wait(&self) {
        let guard = self.lock();
        let _stopped = self
            .cv
            .wait_while(guard, |stopped| !*stopped)
            .unwrap_or_else(PoisonError::into_inner);
    }

    /// Blocks until triggered or `timeout` elapses. Returns whether the
    /// signal is triggered.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let guard = self.lock();
        let (stopped, _) = self
            .cv
            .wait_timeout_while(guard, timeout, |stopped| !*stopped)
            .unwrap_or_else(PoisonError::into_inner);
        *stopped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn sleep_runs_full_interval_when_not_stopped() {
        let signal = StopSignal::new();
        let start = Instant::now();
        assert!(signal.sleep(Duration::from_millis(20)));
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn trigger_cuts_sleep_short() {
        let signal = Arc::new(StopSignal::new());
        let sleeper = {
            let signal = Arc::clone(&signal);
            thread::spawn(move || {
                let start = Instant::now();
                let completed = signal.sleep(Duration::from_secs(30));
                (completed, start.elapsed())
            })
        };

        thread::sleep(Duration::from_millis(20));
        signal.trigger();

        let (completed, elapsed) = sleeper.join().unwrap();
        assert!(!completed);
        assert!(elapsed < Duration::from_secs(5));
    }

    #[test]
    fn sleep_after_trigger_returns_immediately() {
        let signal = StopSignal::new();
        signal.trigger();
        signal.trigger();
        assert!(signal.is_triggered());
        assert!(!signal.sleep(Duration::from_secs(30)));
        signal.wait();
        assert!(signal.wait_timeout(Duration::from_secs(30)));
    }

    #[test]
    fn wait_timeout_reports_untriggered() {
        let signal = StopSignal::new();
        assert!(!signal.wait_timeout(Duration::from_millis(5)));
    }
}
