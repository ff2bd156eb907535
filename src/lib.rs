//! Universal Storage
//!
//! A uniform file-management API (store, retrieve, remove, create/remove folder,
//! clean, wipe) over a pluggable storage provider, with the local filesystem as
//! the built-in provider.

pub mod cli;
pub mod config;
pub mod error;
pub mod events;
pub mod storage;
pub mod utils;

pub use config::Settings;
pub use error::{StorageError, StorageResult};
pub use events::{EventNotifier, LoggingListener, Operation, StorageEvent, StorageListener};
pub use storage::{AsyncStorage, FileStorage, StagedFile, StorageProvider};
