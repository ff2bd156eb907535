//! Event types

use std::fmt;
use std::path::PathBuf;

use crate::error::StorageError;

/// Storage operation that produced an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    StoreFile,
    RemoveFile,
    CreateFolder,
    RemoveFolder,
    RetrieveFile,
    Clean,
    Wipe,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::StoreFile => "store_file",
            Operation::RemoveFile => "remove_file",
            Operation::CreateFolder => "create_folder",
            Operation::RemoveFolder => "remove_folder",
            Operation::RetrieveFile => "retrieve_file",
            Operation::Clean => "clean",
            Operation::Wipe => "wipe",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a storage operation, delivered to every registered listener.
///
/// Paths are the resolved, absolute locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageEvent {
    FileStored { source: PathBuf, destination: PathBuf },
    FileRemoved { path: PathBuf },
    FolderCreated { path: PathBuf },
    FolderRemoved { path: PathBuf },
    FileRetrieved { path: PathBuf, staged: PathBuf },
    Cleaned { tmp: PathBuf },
    Wiped { root: PathBuf },
    Error { operation: Operation, error: StorageError },
}

impl StorageEvent {
    /// Operation this event reports on
    pub fn operation(&self) -> Operation {
        match self {
            StorageEvent::FileStored { .. } => Operation::StoreFile,
            StorageEvent::FileRemoved { .. } => Operation::RemoveFile,
            StorageEvent::FolderCreated { .. } => Operation::CreateFolder,
            StorageEvent::FolderRemoved { .. } => Operation::RemoveFolder,
            StorageEvent::FileRetrieved { .. } => Operation::RetrieveFile,
            StorageEvent::Cleaned { .. } => Operation::Clean,
            StorageEvent::Wiped { .. } => Operation::Wipe,
            StorageEvent::Error { operation, .. } => *operation,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, StorageEvent::Error { .. })
    }
}

impl fmt::Display for StorageEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageEvent::FileStored {
                source,
                destination,
            } => write!(
                f,
                "File stored: {} -> {}",
                source.display(),
                destination.display()
            ),
            StorageEvent::FileRemoved { path } => write!(f, "File removed: {}", path.display()),
            StorageEvent::FolderCreated { path } => {
                write!(f, "Folder created: {}", path.display())
            }
            StorageEvent::FolderRemoved { path } => {
                write!(f, "Folder removed: {}", path.display())
            }
            StorageEvent::FileRetrieved { path, staged } => write!(
                f,
                "File retrieved: {} staged at {}",
                path.display(),
                staged.display()
            ),
            StorageEvent::Cleaned { tmp } => write!(f, "Staging cleaned: {}", tmp.display()),
            StorageEvent::Wiped { root } => write!(f, "Storage wiped: {}", root.display()),
            StorageEvent::Error { operation, error } => {
                write!(f, "{} failed: {}", operation, error)
            }
        }
    }
}
