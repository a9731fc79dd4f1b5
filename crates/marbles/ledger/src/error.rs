use thiserror::Error;

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Ledger-layer errors.
///
/// A missing key is not an error; reads report it as `Ok(None)`.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("ledger lock poisoned: {0}")]
    Poisoned(String),

    #[error("ledger I/O error: {0}")]
    Io(String),

    #[error("ledger serialization error: {0}")]
    Serialization(String),

    /// State read by a transaction changed before it committed.
    #[error("read conflict: {0}")]
    Conflict(String),
}
