//! Error types
//!
//! Defines the error kinds surfaced by every storage operation.

use std::fmt;
use std::io;

/// Result alias used across the storage layer
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage errors
///
/// Every variant carries a human readable message. `Io` forwards the message of the
/// underlying primitive failure without further classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// Root is missing or not a directory, or settings are unusable
    Configuration(String),
    /// Logical path is structurally illegal or escapes the root
    InvalidPath(String),
    /// File-vs-folder misuse; the message names the operation to call instead
    InvalidOperation(String),
    /// Target does not exist
    NotFound(String),
    /// Underlying filesystem failure
    Io(String),
}

impl StorageError {
    /// Short, stable label for the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            StorageError::Configuration(_) => "configuration",
            StorageError::InvalidPath(_) => "invalid-path",
            StorageError::InvalidOperation(_) => "invalid-operation",
            StorageError::NotFound(_) => "not-found",
            StorageError::Io(_) => "io",
        }
    }

    /// The message without the kind prefix
    pub fn message(&self) -> &str {
        match self {
            StorageError::Configuration(m)
            | StorageError::InvalidPath(m)
            | StorageError::InvalidOperation(m)
            | StorageError::NotFound(m)
            | StorageError::Io(m) => m,
        }
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::Configuration(m) => write!(f, "Storage configuration error: {}", m),
            StorageError::InvalidPath(m) => write!(f, "Invalid path: {}", m),
            StorageError::InvalidOperation(m) => write!(f, "Invalid operation: {}", m),
            StorageError::NotFound(m) => write!(f, "Not found: {}", m),
            StorageError::Io(m) => write!(f, "IO error: {}", m),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<io::Error> for StorageError {
    fn from(error: io::Error) -> Self {
        StorageError::Io(error.to_string())
    }
}

impl From<config::ConfigError> for StorageError {
    fn from(error: config::ConfigError) -> Self {
        StorageError::Configuration(error.to_string())
    }
}
