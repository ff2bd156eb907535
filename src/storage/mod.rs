//! File system storage management
//!
//! Path validation, the filesystem provider, temporary staging, and the
//! concurrent access facade.

pub mod concurrent;
pub mod filesystem;
pub mod provider;
pub mod results;
pub mod staging;
pub mod validation;

pub use concurrent::AsyncStorage;
pub use provider::{FileStorage, StorageProvider};
pub use results::StagedFile;
pub use validation::{MAX_PATH_LENGTH, normalize_logical_path, validate_path, validate_root};
