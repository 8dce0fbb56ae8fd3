//! Error types for the SHADE core library.

use thiserror::Error;

/// Top-level error type for all SHADE operations.
#[derive(Error, Debug)]
pub enum ShadeError {
    /// A content index (door, task, checkpoint, ...) is outside its table.
    #[error("{kind} index {index} out of range (len: {len})")]
    IndexOutOfRange {
        /// Which table was indexed.
        kind: &'static str,
        /// The offending index.
        index: usize,
        /// Table length.
        len: usize,
    },

    /// A ledger invariant was violated.
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Violations of progression ordering.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerError {
    /// A completion was recorded for an entry that was never started.
    #[error("cannot complete {kind} #{index}: it was never started")]
    CompletedBeforeStarted {
        /// "interaction" or "task".
        kind: &'static str,
        /// Index of the entry.
        index: usize,
    },
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, ShadeError>;
