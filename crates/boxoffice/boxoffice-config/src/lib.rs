mod config;
mod simulation;

pub use config::{BoxOfficeConfig, ConfigError};
pub use simulation::{Configuration, MAX_RATE, MIN_RATE, validate_positive_int, validate_rate};
