#![forbid(unsafe_code)]

use serde::Serialize;
use std::fmt;

// Worker ids are dense, 1-based and assigned by the controller at spawn time,
// so a u32 newtype is enough. The display form ("V3", "C12") is what the
// ledger and the log stream key on.

/// Identity of a vendor worker. Displays as `V<n>`.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct VendorId(pub u32);

/// Identity of a customer worker. Displays as `C<n>`.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct CustomerId(pub u32);

impl fmt::Display for VendorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "V{}", self.0)
    }
}

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C{}", self.0)
    }
}
