use std::sync::PoisonError;

use crate::mvcc::TransactionId;

/// Custom Result type for mvccdb operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for mvccdb
///
/// Every failure is an explicit value returned from the operation that hit
/// it; errors are never used for internal control flow.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// Operation attempted on a transaction outside the required lifecycle
    /// state (terminated transaction, double BEGIN on one session, ...)
    #[error("invalid transaction state: {0}")]
    InvalidTransactionState(String),
    /// Transaction id was never issued by the registry
    #[error("unknown transaction {0}")]
    UnknownTransaction(TransactionId),
    /// No version of the key is visible to the reader
    #[error("key not found: {0}")]
    KeyNotFound(String),
    /// Commit-time validation failed; the transaction has been aborted
    #[error("serialization failure: {0}")]
    SerializationFailure(String),
    /// Command parsing error
    #[error("parse error: {0}")]
    Parse(String),
    /// Internal error (poisoned lock, broken invariant, ...)
    #[error("internal error: {0}")]
    Internal(String),
}

impl<T> From<PoisonError<T>> for Error {
    fn from(value: PoisonError<T>) -> Self {
        Error::Internal(value.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Error::Internal(value.to_string())
    }
}
