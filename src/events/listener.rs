//! Listener capability set

use log::{error, info};
use std::path::Path;

use crate::error::StorageError;
use crate::events::types::{Operation, StorageEvent};

/// Observer of storage outcomes.
///
/// Every hook defaults to a no-op, so implementors override only what they need.
/// `on_event` receives every event and by default routes it to the matching hook.
pub trait StorageListener: Send + Sync {
    fn on_event(&self, event: &StorageEvent) {
        match event {
            StorageEvent::FileStored {
                source,
                destination,
            } => self.on_file_stored(source, destination),
            StorageEvent::FileRemoved { path } => self.on_file_removed(path),
            StorageEvent::FolderCreated { path } => self.on_folder_created(path),
            StorageEvent::FolderRemoved { path } => self.on_folder_removed(path),
            StorageEvent::FileRetrieved { path, staged } => self.on_file_retrieved(path, staged),
            StorageEvent::Cleaned { tmp } => self.on_cleaned(tmp),
            StorageEvent::Wiped { root } => self.on_wiped(root),
            StorageEvent::Error { operation, error } => self.on_error(*operation, error),
        }
    }

    fn on_file_stored(&self, _source: &Path, _destination: &Path) {}

    fn on_file_removed(&self, _path: &Path) {}

    fn on_folder_created(&self, _path: &Path) {}

    fn on_folder_removed(&self, _path: &Path) {}

    fn on_file_retrieved(&self, _path: &Path, _staged: &Path) {}

    fn on_cleaned(&self, _tmp: &Path) {}

    fn on_wiped(&self, _root: &Path) {}

    fn on_error(&self, _operation: Operation, _error: &StorageError) {}
}

/// Listener that writes every event to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingListener;

impl StorageListener for LoggingListener {
    fn on_event(&self, event: &StorageEvent) {
        if event.is_error() {
            error!("{}", event);
        } else {
            info!("{}", event);
        }
    }
}
