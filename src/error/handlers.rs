//! Error handlers
//!
//! Provides reporting helpers for storage errors.

use crate::error::types::StorageError;
use log::error;

/// Log a storage error
pub fn handle_error(err: &StorageError) {
    error!("Storage error [{}]: {}", err.kind(), err);
}

/// Convert error to a process exit code (sysexits values)
pub fn error_to_exit_code(err: &StorageError) -> i32 {
    match err {
        StorageError::Configuration(_) => 78,
        StorageError::InvalidPath(_) => 64,
        StorageError::InvalidOperation(_) => 64,
        StorageError::NotFound(_) => 66,
        StorageError::Io(_) => 74,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_distinguish_kinds() {
        assert_eq!(error_to_exit_code(&StorageError::Configuration("x".into())), 78);
        assert_eq!(error_to_exit_code(&StorageError::NotFound("x".into())), 66);
        assert_eq!(error_to_exit_code(&StorageError::Io("x".into())), 74);
        assert_eq!(
            error_to_exit_code(&StorageError::InvalidPath("x".into())),
            error_to_exit_code(&StorageError::InvalidOperation("x".into()))
        );
    }
}
