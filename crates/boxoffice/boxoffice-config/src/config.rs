use crate::simulation::Configuration;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The `boxoffice.toml` file.
///
/// ```toml
/// log_level = "info"
/// ledger_dir = "ledger"
/// status_interval_ms = 1000
///
/// [simulation]
/// total_tickets = 50
/// max_ticket_capacity = 500
/// ticket_release_rate_secs = 5
/// customer_retrieval_rate_secs = 3
/// vendor_count = 5
/// customer_count = 7
/// ```
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct BoxOfficeConfig {
    #[serde(default = "defaults::log_level")]
    pub log_level: String,
    /// Directory for per-run JSON ledgers. In-memory ledger when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ledger_dir: Option<PathBuf>,
    #[serde(default = "defaults::status_interval_ms")]
    pub status_interval_ms: u64,
    /// Seed for batch sizes; fresh entropy per run when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    #[serde(default)]
    pub simulation: Configuration,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read '{path}'")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config")]
    Serialize(#[from] toml::ser::Error),

    #[error("failed to write '{path}'")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid {field} = {value}: {reason}")]
    InvalidConfig {
        field: &'static str,
        value: i64,
        reason: &'static str,
    },
}

mod defaults {
    pub fn log_level() -> String {
        "info".into()
    }

    pub fn status_interval_ms() -> u64 {
        1_000
    }
}

impl Default for BoxOfficeConfig {
    fn default() -> Self {
        Self {
            log_level: defaults::log_level(),
            ledger_dir: None,
            status_interval_ms: defaults::status_interval_ms(),
            seed: None,
            simulation: Configuration::default(),
        }
    }
}

impl BoxOfficeConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let toml_to_str = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&toml_to_str)
    }

    pub fn parse(toml_str: &str) -> Result<Self, ConfigError> {
        let config: BoxOfficeConfig = toml::from_str(toml_str)?;
        // The sampler waits this long between snapshots; zero would spin.
        if config.status_interval_ms == 0 {
            return Err(ConfigError::InvalidConfig {
                field: "status_interval_ms",
                value: 0,
                reason: "must be a positive number",
            });
        }
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let body = toml::to_string_pretty(self)?;
        std::fs::write(path, body).map_err(|source| ConfigError::Write {
            path: path.display().to_string(),
            source,
        })
    }
}
