/// Result of a vendor's `release` call.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseOutcome {
    /// `added` tickets went into the pool. May be fewer than requested when
    /// the batch was clipped to the remaining capacity.
    Released { added: u32 },
    /// Capacity is fully released; nothing was added.
    SupplyExhausted,
    /// The run is sold out; nothing was added.
    Closed,
    /// The run was stopped; nothing was added.
    Cancelled,
}

impl ReleaseOutcome {
    /// `true` when tickets were added. A vendor stops on `false`.
    #[inline]
    pub fn is_released(&self) -> bool {
        matches!(self, ReleaseOutcome::Released { .. })
    }
}

/// Result of a customer's `purchase` call.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurchaseOutcome {
    /// The full batch was taken from the pool.
    Purchased,
    /// Taking the batch would sell more than the capacity; nothing was taken.
    WouldOvershoot,
    /// The pool is closed (or this call closed it); nothing was taken.
    SoldOut,
    /// The run was stopped while the customer was waiting or before it began.
    Cancelled,
}

impl PurchaseOutcome {
    /// `true` when the batch was bought. A customer stops on `false`.
    #[inline]
    pub fn is_purchased(&self) -> bool {
        matches!(self, PurchaseOutcome::Purchased)
    }
}
