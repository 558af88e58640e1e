//! Error types for feeder-storage

use thiserror::Error;

/// Errors that can occur in feed storage operations
///
/// Errors are passed through the feed layer untouched, so callers see
/// backend-shaped errors directly.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backing store failed (transaction, table, or commit error)
    #[error("Backend error: {0}")]
    Backend(String),

    /// Stored metadata could not be parsed (e.g. a non-numeric counter)
    #[error("Parse error: {0}")]
    Parse(String),

    /// A request was rejected before reaching the store
    #[error("Validation error: {0}")]
    Validation(String),

    /// I/O error while preparing storage
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::Io(err.to_string())
    }
}

impl StorageError {
    /// Create a new Backend error
    pub fn backend(err: impl std::fmt::Display) -> Self {
        Self::Backend(err.to_string())
    }

    /// Create a new Parse error
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// Create a new Validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}
