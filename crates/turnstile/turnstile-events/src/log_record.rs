use serde::Serialize;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Wall-clock nanoseconds since the unix epoch.
///
/// Returns 0 if the system clock reads earlier than the epoch.
#[inline]
pub fn now_ns() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

/// Severity attached to a system log line pushed to observers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
        };
        f.write_str(s)
    }
}

/// One line of the system log stream.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LogRecord {
    pub level: LogLevel,
    pub message: String,
    /// Wall-clock time the record was produced (nanoseconds since epoch)
    pub ts_ns: u64,
}

impl LogRecord {
    /// Stamps `message` with the current time.
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            ts_ns: now_ns(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Info, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Warning, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_record_is_timestamped() {
        let before = now_ns();
        let rec = LogRecord::info("pool initialized");
        assert!(rec.ts_ns >= before);
        assert_eq!(rec.level, LogLevel::Info);
        assert_eq!(rec.message, "pool initialized");
    }

    #[test]
    fn levels_serialize_uppercase() {
        let rec = LogRecord {
            level: LogLevel::Warning,
            message: "customer waiting".into(),
            ts_ns: 7,
        };
        let json = serde_json::to_string(&rec).unwrap();
        assert_eq!(
            json,
            r#"{"level":"WARNING","message":"customer waiting","ts_ns":7}"#
        );
    }
}
