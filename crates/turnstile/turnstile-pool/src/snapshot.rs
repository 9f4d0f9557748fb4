use turnstile_events::TicketStatus;

/// Where a pool is in its lifecycle.
///
/// ```text
/// Idle -> Initialized -> Running -> SupplyExhausted -> Closed
/// ```
///
/// `SupplyExhausted` only stops vendors; customers keep draining what is
/// left. `Closed` is terminal until the next `initialize`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PoolPhase {
    Idle,
    Initialized,
    Running,
    SupplyExhausted,
    Closed,
}

/// A consistent copy of the pool counters, taken under the pool lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSnapshot {
    pub capacity: u32,
    pub released: u32,
    pub sold: u32,
    pub available: u32,
    /// Unsold tickets withdrawn when the pool closed before selling out.
    /// Always 0 while the pool is open.
    pub retired: u32,
    pub supply_exhausted: bool,
    pub demand_exhausted: bool,
    pub phase: PoolPhase,
}

impl PoolSnapshot {
    /// The observer-facing subset of the snapshot.
    pub fn status(&self) -> TicketStatus {
        TicketStatus {
            available_tickets: self.available,
            total_released: self.released,
            supply_exhausted: self.supply_exhausted,
            demand_exhausted: self.demand_exhausted,
        }
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.demand_exhausted
    }
}
