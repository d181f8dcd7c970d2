use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the settlement report tooling.
///
/// Per-row faults inside a ledger never surface here; they are absorbed by
/// the record builder and only show up as skip counts.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// A ledger file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The ledger exceeds the configured size ceiling.
    #[error("File {path} is {size} bytes, larger than the {limit} byte limit")]
    FileTooLarge { path: PathBuf, size: u64, limit: u64 },

    /// The ledger bytes are not valid UTF-8.
    #[error("File {path} is not valid UTF-8 text")]
    InvalidEncoding { path: PathBuf },

    /// The ledger parsed cleanly but contained no usable transaction rows.
    #[error("No valid transaction data found")]
    NoTransactions,

    /// The report could not be serialised.
    #[error("Failed to serialize report: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the settlement crates.
pub type Result<T> = std::result::Result<T, LedgerError>;
