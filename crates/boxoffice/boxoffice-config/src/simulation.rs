use crate::config::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const MIN_RATE: i64 = 1;
pub const MAX_RATE: i64 = 10;

/// Rejects anything that is not a positive `u32`.
pub fn validate_positive_int(field: &'static str, value: i64) -> Result<u32, ConfigError> {
    if value <= 0 {
        return Err(ConfigError::InvalidConfig {
            field,
            value,
            reason: "must be a positive number",
        });
    }
    u32::try_from(value).map_err(|_| ConfigError::InvalidConfig {
        field,
        value,
        reason: "is too large",
    })
}

/// Rejects a rate outside `MIN_RATE..=MAX_RATE` seconds.
pub fn validate_rate(field: &'static str, value: i64) -> Result<u32, ConfigError> {
    if !(MIN_RATE..=MAX_RATE).contains(&value) {
        return Err(ConfigError::InvalidConfig {
            field,
            value,
            reason: "must be between 1 and 10",
        });
    }
    Ok(value as u32)
}

/// Parameters of one simulation run. Always validated; the only ways to get
/// one are [`Configuration::new`], [`Configuration::default`] and
/// deserialization, which runs the same checks.
///
/// `total_tickets` may exceed `max_ticket_capacity`; the pool clips the
/// initial batch when it is seeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawConfiguration")]
pub struct Configuration {
    total_tickets: u32,
    max_ticket_capacity: u32,
    ticket_release_rate_secs: u32,
    customer_retrieval_rate_secs: u32,
    vendor_count: u32,
    customer_count: u32,
}

impl Configuration {
    pub fn new(
        total_tickets: i64,
        max_ticket_capacity: i64,
        ticket_release_rate_secs: i64,
        customer_retrieval_rate_secs: i64,
        vendor_count: i64,
        customer_count: i64,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            total_tickets: validate_positive_int("total_tickets", total_tickets)?,
            max_ticket_capacity: validate_positive_int("max_ticket_capacity", max_ticket_capacity)?,
            ticket_release_rate_secs: validate_rate(
                "ticket_release_rate_secs",
                ticket_release_rate_secs,
            )?,
            customer_retrieval_rate_secs: validate_rate(
                "customer_retrieval_rate_secs",
                customer_retrieval_rate_secs,
            )?,
            vendor_count: validate_positive_int("vendor_count", vendor_count)?,
            customer_count: validate_positive_int("customer_count", customer_count)?,
        })
    }

    pub fn total_tickets(&self) -> u32 {
        self.total_tickets
    }

    pub fn max_ticket_capacity(&self) -> u32 {
        self.max_ticket_capacity
    }

    pub fn ticket_release_rate_secs(&self) -> u32 {
        self.ticket_release_rate_secs
    }

    pub fn customer_retrieval_rate_secs(&self) -> u32 {
        self.customer_retrieval_rate_secs
    }

    pub fn vendor_count(&self) -> u32 {
        self.vendor_count
    }

    pub fn customer_count(&self) -> u32 {
        self.customer_count
    }

    /// Pause between vendor releases, `unit` being the length of one rate
    /// step (one second in a real run).
    pub fn release_interval(&self, unit: Duration) -> Duration {
        unit * self.ticket_release_rate_secs
    }

    /// Pause between customer purchases.
    pub fn retrieval_interval(&self, unit: Duration) -> Duration {
        unit * self.customer_retrieval_rate_secs
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            total_tickets: defaults::total_tickets() as u32,
            max_ticket_capacity: defaults::max_ticket_capacity() as u32,
            ticket_release_rate_secs: defaults::ticket_release_rate_secs() as u32,
            customer_retrieval_rate_secs: defaults::customer_retrieval_rate_secs() as u32,
            vendor_count: defaults::vendor_count() as u32,
            customer_count: defaults::customer_count() as u32,
        }
    }
}

/// Wire form: wide signed integers so that negative or oversized values are
/// reported as invalid settings rather than parse failures.
#[derive(Deserialize)]
struct RawConfiguration {
    #[serde(default = "defaults::total_tickets")]
    total_tickets: i64,
    #[serde(default = "defaults::max_ticket_capacity")]
    max_ticket_capacity: i64,
    #[serde(default = "defaults::ticket_release_rate_secs")]
    ticket_release_rate_secs: i64,
    #[serde(default = "defaults::customer_retrieval_rate_secs")]
    customer_retrieval_rate_secs: i64,
    #[serde(default = "defaults::vendor_count")]
    vendor_count: i64,
    #[serde(default = "defaults::customer_count")]
    customer_count: i64,
}

impl TryFrom<RawConfiguration> for Configuration {
    type Error = ConfigError;

    fn try_from(raw: RawConfiguration) -> Result<Self, Self::Error> {
        Configuration::new(
            raw.total_tickets,
            raw.max_ticket_capacity,
            raw.ticket_release_rate_secs,
            raw.customer_retrieval_rate_secs,
            raw.vendor_count,
            raw.customer_count,
        )
    }
}

mod defaults {
    pub fn total_tickets() -> i64 {
        50
    }

    pub fn max_ticket_capacity() -> i64 {
        500
    }

    pub fn ticket_release_rate_secs() -> i64 {
        5
    }

    pub fn customer_retrieval_rate_secs() -> i64 {
        3
    }

    pub fn vendor_count() -> i64 {
        5
    }

    pub fn customer_count() -> i64 {
        7
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_settings() {
        let cfg = Configuration::new(80, 50, 1, 10, 2, 3).unwrap();
        assert_eq!(cfg.total_tickets(), 80);
        assert_eq!(cfg.max_ticket_capacity(), 50);
        assert_eq!(cfg.vendor_count(), 2);
        assert_eq!(cfg.customer_count(), 3);
    }

    #[test]
    fn rejects_non_positive_counts() {
        for bad in [0, -4] {
            let err = Configuration::new(bad, 50, 1, 1, 1, 1).unwrap_err();
            assert!(matches!(
                err,
                ConfigError::InvalidConfig { field: "total_tickets", .. }
            ));
        }
        let err = Configuration::new(5, 5, 1, 1, 1, 0).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidConfig { field: "customer_count", value: 0, .. }
        ));
    }

    #[test]
    fn rejects_rates_outside_one_to_ten() {
        assert!(validate_rate("r", 0).is_err());
        assert!(validate_rate("r", 11).is_err());
        assert_eq!(validate_rate("r", 1).unwrap(), 1);
        assert_eq!(validate_rate("r", 10).unwrap(), 10);
        let err = Configuration::new(5, 5, 1, 12, 1, 1).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidConfig { field: "customer_retrieval_rate_secs", .. }
        ));
    }

    #[test]
    fn rejects_values_beyond_u32() {
        assert!(validate_positive_int("n", i64::from(u32::MAX) + 1).is_err());
    }

    #[test]
    fn intervals_scale_with_unit() {
        let cfg = Configuration::new(10, 10, 4, 2, 1, 1).unwrap();
        assert_eq!(cfg.release_interval(Duration::from_secs(1)), Duration::from_secs(4));
        assert_eq!(cfg.retrieval_interval(Duration::from_millis(3)), Duration::from_millis(6));
    }

    #[test]
    fn default_matches_stock_settings() {
        let cfg = Configuration::default();
        assert_eq!(
            (
                cfg.total_tickets(),
                cfg.ticket_release_rate_secs(),
                cfg.customer_retrieval_rate_secs(),
                cfg.max_ticket_capacity(),
                cfg.vendor_count(),
                cfg.customer_count()
            ),
            (50, 5, 3, 500, 5, 7)
        );
    }
}
