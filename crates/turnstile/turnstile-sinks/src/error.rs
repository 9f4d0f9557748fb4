use std::path::PathBuf;

/// Failure to record a release or purchase in the ledger.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("failed to write ledger file '{path}'")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode ledger")]
    Encode(#[from] serde_json::Error),

    #[error("ledger state poisoned by a panicked writer")]
    Poisoned,
}

/// Failure to hand a status event or log line to an observer.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("status observer disconnected")]
    Disconnected,
}
