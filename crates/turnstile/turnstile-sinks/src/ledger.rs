//! Running totals keyed by vendor / customer id.
//!
//! Every successful release or purchase is folded into an upsert table:
//! the first record for an id inserts it, later records add to its total.

use crate::error::LedgerError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use turnstile_events::{CustomerId, VendorId, now_ns};

/// Sink for per-worker ticket totals.
///
/// Implementations must be callable from any worker thread. They are never
/// invoked while the pool lock is held.
pub trait LedgerSink: Send + Sync {
    fn record_release(&self, vendor: VendorId, count: u32) -> Result<(), LedgerError>;
    fn record_purchase(&self, customer: CustomerId, count: u32) -> Result<(), LedgerError>;
}

/// Upsert tables for one simulation run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerTotals {
    /// vendor id -> tickets released
    pub vendors: BTreeMap<String, u64>,
    /// customer id -> tickets bought
    pub customers: BTreeMap<String, u64>,
}

impl LedgerTotals {
    fn add_release(&mut self, vendor: VendorId, count: u32) {
        *self.vendors.entry(vendor.to_string()).or_default() += u64::from(count);
    }

    fn add_purchase(&mut self, customer: CustomerId, count: u32) {
        *self.customers.entry(customer.to_string()).or_default() += u64::from(count);
    }

    pub fn total_released(&self) -> u64 {
        self.vendors.values().sum()
    }

    pub fn total_bought(&self) -> u64 {
        self.customers.values().sum()
    }
}

/// In-process ledger. Useful on its own for short runs and in tests.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    totals: Mutex<LedgerTotals>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the current tables.
    pub fn totals(&self) -> LedgerTotals {
        match self.totals.lock() {
            Ok(t) => t.clone(),
            Err(poison) => poison.into_inner().clone(),
        }
    }

    pub fn vendor_total(&self, vendor: VendorId) -> u64 {
        self.totals()
            .vendors
            .get(&vendor.to_string())
            .copied()
            .unwrap_or(0)
    }

    pub fn customer_total(&self, customer: CustomerId) -> u64 {
        self.totals()
            .customers
            .get(&customer.to_string())
            .copied()
            .unwrap_or(0)
    }
}

impl LedgerSink for MemoryLedger {
    fn record_release(&self, vendor: VendorId, count: u32) -> Result<(), LedgerError> {
        let mut totals = self.totals.lock().map_err(|_| LedgerError::Poisoned)?;
        totals.add_release(vendor, count);
        Ok(())
    }

    fn record_purchase(&self, customer: CustomerId, count: u32) -> Result<(), LedgerError> {
        let mut totals = self.totals.lock().map_err(|_| LedgerError::Poisoned)?;
        totals.add_purchase(customer, count);
        Ok(())
    }
}

/// Ledger persisted as a pretty-printed JSON document.
///
/// Each instance owns one file, `simulation_<unix-secs>.json`, created in the
/// directory handed to [`JsonFileLedger::create`]. The whole document is
/// rewritten (write to a sibling temp file, then rename) after every record,
/// so a reader never observes a half-written file.
#[derive(Debug)]
pub struct JsonFileLedger {
    path: PathBuf,
    totals: Mutex<LedgerTotals>,
}

impl JsonFileLedger {
    /// Creates `dir` if needed and claims a fresh file name inside it.
    pub fn create(dir: impl AsRef<Path>) -> Result<Self, LedgerError> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir).map_err(|source| LedgerError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let secs = now_ns() / 1_000_000_000;
        let mut path = dir.join(format!("simulation_{secs}.json"));
        let mut n = 1;
        while path.exists() {
            path = dir.join(format!("simulation_{secs}_{n}.json"));
            n += 1;
        }

        let ledger = Self {
            path,
            totals: Mutex::new(LedgerTotals::default()),
        };
        ledger.flush(&LedgerTotals::default())?;
        Ok(ledger)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads a ledger file back.
    pub fn read(path: impl AsRef<Path>) -> Result<LedgerTotals, LedgerError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| LedgerError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&raw)?)
    }

    fn flush(&self, totals: &LedgerTotals) -> Result<(), LedgerError> {
        let body = serde_json::to_vec_pretty(totals)?;
        let tmp = self.path.with_extension("json.tmp");
        let io_err = |source| LedgerError::Io {
            path: self.path.clone(),
            source,
        };
        std::fs::write(&tmp, body).map_err(io_err)?;
        std::fs::rename(&tmp, &self.path).map_err(io_err)
    }

    fn update(&self, apply: impl FnOnce(&mut LedgerTotals)) -> Result<(), LedgerError> {
        // The lock is held across the file write so concurrent records land
        // in the file in the same order they were applied.
        let mut totals = self.totals.lock().map_err(|_| LedgerError::Poisoned)?;
        apply(&mut totals);
        self.flush(&totals)
    }
}

impl LedgerSink for JsonFileLedger {
    fn record_release(&self, vendor: VendorId, count: u32) -> Result<(), LedgerError> {
        self.update(|t| t.add_release(vendor, count))
    }

    fn record_purchase(&self, customer: CustomerId, count: u32) -> Result<(), LedgerError> {
        self.update(|t| t.add_purchase(customer, count))
    }
}
