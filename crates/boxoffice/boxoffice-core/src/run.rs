//! The handle every worker of one run shares.
//!
//! A run ends in one of three ways:
//!
//! ```text
//! stop()        -> stop signal + pool cancel   (blocked purchases return)
//! pool closes   -> stop signal                  (sleeping vendors wake)
//! last worker   -> stop signal                  (sampler exits)
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::debug;
use turnstile_pool::{StopSignal, TicketPool};

struct RunShared {
    pool: Arc<TicketPool>,
    stop: StopSignal,
    live: AtomicUsize,
}

/// Cheap to clone; all clones refer to the same run.
#[derive(Clone)]
pub struct RunHandle {
    shared: Arc<RunShared>,
}

impl RunHandle {
    pub fn new(pool: Arc<TicketPool>) -> Self {
        Self {
            shared: Arc::new(RunShared {
                pool,
                stop: StopSignal::new(),
                live: AtomicUsize::new(0),
            }),
        }
    }

    pub fn pool(&self) -> &TicketPool {
        &self.shared.pool
    }

    /// Ends the run from outside: wakes sleepers and every blocked purchase.
    pub fn stop(&self) {
        self.shared.stop.trigger();
        self.shared.pool.cancel();
    }

    /// Marks the run as finished on its own. Blocked purchases are left to
    /// the pool, which has already woken them if it closed.
    pub fn settle(&self) {
        self.shared.stop.trigger();
    }

    /// True once the run was stopped or has settled.
    pub fn is_stopped(&self) -> bool {
        self.shared.stop.is_triggered()
    }

    /// Interruptible pause. `false` if the run ended before `interval` passed.
    pub fn sleep(&self, interval: Duration) -> bool {
        self.shared.stop.sleep(interval)
    }

    pub fn wait(&self) {
        self.shared.stop.wait();
    }

    /// Returns whether the run has ended.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        self.shared.stop.wait_timeout(timeout)
    }

    /// Whether both handles belong to the same run.
    pub fn same_run(&self, other: &RunHandle) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }

    pub fn live_workers(&self) -> usize {
        self.shared.live.load(Ordering::Acquire)
    }

    /// Counts one more live worker until the guard drops. The run settles
    /// when the last guard goes.
    ///
    /// Take the guard on the spawning thread, before the worker starts, so
    /// an early exit cannot settle a run that is still being populated.
    pub fn enlist(&self) -> LiveGuard {
        self.shared.live.fetch_add(1, Ordering::AcqRel);
        LiveGuard { run: self.clone() }
    }
}

/// Keeps a worker counted as live. See [`RunHandle::enlist`].
pub struct LiveGuard {
    run: RunHandle,
}

impl Drop for LiveGuard {
    fn drop(&mut self) {
        let prev = self.run.shared.live.fetch_sub(1, Ordering::AcqRel);
        if prev == 1 {
            debug!("last worker exited, settling run");
            self.run.settle();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use turnstile_pool::PoolConfig;
    use turnstile_sinks::StatusRecorder;

    fn handle() -> RunHandle {
        let pool = TicketPool::seeded(PoolConfig::new(5, 10), Arc::new(StatusRecorder::new()));
        RunHandle::new(Arc::new(pool))
    }

    #[test]
    fn last_guard_settles_the_run() {
        let run = handle();
        let a = run.enlist();
        let b = run.enlist();
        assert_eq!(run.live_workers(), 2);

        drop(a);
        assert!(!run.is_stopped());
        drop(b);
        assert_eq!(run.live_workers(), 0);
        assert!(run.is_stopped());
        // Settling does not cancel the pool.
        assert!(!run.pool().is_cancelled());
    }

    #[test]
    fn stop_cancels_the_pool() {
        let run = handle();
        let clone = run.clone();
        run.stop();
        assert!(clone.is_stopped());
        assert!(clone.pool().is_cancelled());
        assert!(!clone.sleep(Duration::from_secs(30)));
        assert!(clone.wait_timeout(Duration::from_secs(30)));
    }
}
