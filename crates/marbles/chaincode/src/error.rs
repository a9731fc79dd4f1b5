use marbles_ledger::LedgerError;
use marbles_types::CodecError;
use thiserror::Error;

/// Result type for chaincode operations.
pub type ChaincodeResult<T> = Result<T, ChaincodeError>;

/// Malformed invocation arguments. Positions are zero-based.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Incorrect number of arguments. Expecting {expected}, got {got}")]
    ArgumentCount { expected: String, got: usize },

    #[error("Argument {index} must be a non-empty string")]
    Empty { index: usize },

    #[error("Argument {index} must be <= {max} characters")]
    TooLong { index: usize, max: usize },

    #[error("Argument {index} must be a numeric string")]
    NotNumeric { index: usize },
}

/// Chaincode errors, surfaced to the caller as their display string.
#[derive(Debug, Error)]
pub enum ChaincodeError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("invalid arguments: {0}")]
    Validation(#[from] ValidationError),

    #[error("not authorized: {0}")]
    Authorization(String),

    #[error("invalid state: {0}")]
    State(String),

    #[error("Received unknown invoke function name - '{0}'")]
    UnknownFunction(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("ledger error: {0}")]
    Store(#[from] LedgerError),
}

impl From<CodecError> for ChaincodeError {
    fn from(value: CodecError) -> Self {
        Self::Serialization(value.to_string())
    }
}

impl From<serde_json::Error> for ChaincodeError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value.to_string())
    }
}
