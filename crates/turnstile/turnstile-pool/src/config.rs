//! Sizing of a ticket pool for one run.

/// How a pool is seeded when a run starts.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    /// Tickets placed in the pool up front (clipped to `capacity`).
    pub total_tickets: u32,
    /// Hard ceiling on tickets ever released during the run.
    pub capacity: u32,
}

impl PoolConfig {
    /// Creates a pool configuration.
    ///
    /// `total_tickets` may exceed `capacity`; the excess is dropped when the
    /// pool is seeded.
    ///
    /// # Panics
    /// Panics if `capacity` is 0.
    ///
    /// # Example
    /// ```
    /// use turnstile_pool::PoolConfig;
    /// let cfg = PoolConfig::new(80, 50);
    /// assert_eq!(cfg.initial_tickets(), 50);
    /// ```
    pub fn new(total_tickets: u32, capacity: u32) -> Self {
        assert!(capacity > 0, "Capacity must be positive");
        Self {
            total_tickets,
            capacity,
        }
    }

    /// Tickets released by `initialize`: `min(total_tickets, capacity)`.
    #[inline]
    pub fn initial_tickets(&self) -> u32 {
        self.total_tickets.min(self.capacity)
    }
}
