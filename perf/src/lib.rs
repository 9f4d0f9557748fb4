//! Contention measurements for `TicketPool`.
//!
//! Vendors and customers hammer one pool with single-ticket calls. Release
//! and purchase latencies are kept apart: a purchase can block on an empty
//! pool, a release only ever waits for the lock.

use serde::Serialize;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};
use turnstile_events::{CustomerId, LogRecord, TicketStatus, VendorId};
use turnstile_pool::{PoolConfig, TicketPool};
use turnstile_sinks::{SinkError, StatusSink};

/// Discards everything, so measurements cover the pool alone.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl StatusSink for NullSink {
    fn publish_status(&self, _: &TicketStatus) -> Result<(), SinkError> {
        Ok(())
    }

    fn publish_log(&self, _: &LogRecord) -> Result<(), SinkError> {
        Ok(())
    }
}

pub fn quiet_pool(total_tickets: u32, capacity: u32) -> TicketPool {
    TicketPool::seeded(
        PoolConfig::new(total_tickets, capacity),
        Arc::new(NullSink),
    )
}

/// Raw samples from one contended run.
#[derive(Debug, Clone)]
pub struct Contention {
    pub pairs: u32,
    pub release_ns: Vec<u64>,
    pub purchase_ns: Vec<u64>,
    /// Purchases the pool turned down. Zero in a balanced run.
    pub refused: usize,
    pub wall: Duration,
}

/// `pairs` vendors each release `per_thread` single tickets while `pairs`
/// customers each buy `per_thread` single tickets, all let go at once.
/// Capacity matches demand exactly, so every purchase should succeed.
pub fn contend(pairs: u32, per_thread: u32) -> Contention {
    let pool = quiet_pool(0, pairs * per_thread);
    let gate = Barrier::new(2 * pairs as usize + 1);

    thread::scope(|s| {
        let vendors: Vec<_> = (1..=pairs)
            .map(|i| {
                let (pool, gate) = (&pool, &gate);
                s.spawn(move || {
                    let mut samples = Vec::with_capacity(per_thread as usize);
                    gate.wait();
                    for _ in 0..per_thread {
                        let start = Instant::now();
                        let _ = pool.release(VendorId(i), 1);
                        samples.push(elapsed_ns(start));
                    }
                    samples
                })
            })
            .collect();

        let customers: Vec<_> = (1..=pairs)
            .map(|i| {
                let (pool, gate) = (&pool, &gate);
                s.spawn(move || {
                    let mut samples = Vec::with_capacity(per_thread as usize);
                    let mut refused = 0;
                    gate.wait();
                    for _ in 0..per_thread {
                        let start = Instant::now();
                        if !pool.purchase(CustomerId(i), 1).is_purchased() {
                            refused += 1;
                        }
                        samples.push(elapsed_ns(start));
                    }
                    (samples, refused)
                })
            })
            .collect();

        gate.wait();
        let began = Instant::now();

        let mut release_ns = Vec::new();
        for v in vendors {
            release_ns.extend(v.join().unwrap_or_else(|e| std::panic::resume_unwind(e)));
        }
        let mut purchase_ns = Vec::new();
        let mut refused = 0;
        for c in customers {
            let (samples, r) = c.join().unwrap_or_else(|e| std::panic::resume_unwind(e));
            purchase_ns.extend(samples);
            refused += r;
        }

        Contention {
            pairs,
            release_ns,
            purchase_ns,
            refused,
            wall: began.elapsed(),
        }
    })
}

fn elapsed_ns(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_nanos()).unwrap_or(u64::MAX)
}

/// Nearest-rank summary of a latency sample set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Latency {
    pub samples: usize,
    pub median_ns: u64,
    pub p95_ns: u64,
    pub p99_ns: u64,
    pub worst_ns: u64,
}

impl Latency {
    pub fn of(samples: &[u64]) -> Option<Self> {
        let mut sorted = samples.to_vec();
        sorted.sort_unstable();
        let worst_ns = *sorted.last()?;
        // Smallest sample with at least `per_mille` of the set at or below it.
        let rank = |per_mille: usize| {
            let n = sorted.len();
            sorted[(n * per_mille).div_ceil(1000).clamp(1, n) - 1]
        };
        Some(Self {
            samples: sorted.len(),
            median_ns: rank(500),
            p95_ns: rank(950),
            p99_ns: rank(990),
            worst_ns,
        })
    }
}

/// One line of the pool report.
#[derive(Debug, Clone, Serialize)]
pub struct ContentionReport {
    pub pairs: u32,
    pub tickets: usize,
    pub refused: usize,
    pub tickets_per_sec: f64,
    pub release: Option<Latency>,
    pub purchase: Option<Latency>,
}

impl From<&Contention> for ContentionReport {
    fn from(run: &Contention) -> Self {
        let tickets = run.purchase_ns.len() - run.refused;
        let secs = run.wall.as_secs_f64();
        Self {
            pairs: run.pairs,
            tickets,
            refused: run.refused,
            tickets_per_sec: if secs > 0.0 { tickets as f64 / secs } else { 0.0 },
            release: Latency::of(&run.release_ns),
            purchase: Latency::of(&run.purchase_ns),
        }
    }
}
