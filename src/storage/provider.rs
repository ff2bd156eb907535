//! Storage provider
//!
//! `StorageProvider` is the uniform file-management API. `FileStorage` implements
//! it on the local filesystem: every operation validates its input and the root,
//! resolves `root + path`, checks existence and type, delegates to the primitive
//! layer, and reports the outcome to registered listeners.

use log::{debug, info};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::Settings;
use crate::error::{StorageError, StorageResult};
use crate::events::{EventNotifier, Operation, StorageEvent, StorageListener};
use crate::storage::filesystem;
use crate::storage::results::StagedFile;
use crate::storage::staging;
use crate::storage::validation::{
    normalize_logical_path, resolve_within_root, validate_path, validate_root,
};

/// Uniform file operations against a logical root
pub trait StorageProvider: Send + Sync {
    /// Copy `source` into the directory `target` (the root when `None`), replacing
    /// a file of the same name.
    fn store_file(&self, source: &Path, target: Option<&str>) -> StorageResult<()>;

    /// Same as [`store_file`](Self::store_file) for a source given as a string.
    /// With a target, both strings are validated first.
    fn store_path(&self, source: &str, target: Option<&str>) -> StorageResult<()> {
        if let Some(target) = target {
            validate_path(source)?;
            validate_path(target)?;
        }
        self.store_file(Path::new(source), target)
    }

    fn remove_file(&self, path: &str) -> StorageResult<()>;

    fn create_folder(&self, path: &str) -> StorageResult<()>;

    fn remove_folder(&self, path: &str) -> StorageResult<()>;

    /// Stage the file at `path` into the tmp directory. An empty path yields `None`.
    fn retrieve_file(&self, path: &str) -> StorageResult<Option<StagedFile>>;

    /// Open a reader over a freshly staged copy of the file at `path`
    fn retrieve_file_as_stream(&self, path: &str) -> StorageResult<Box<dyn Read + Send>>;

    /// Clear the staging directory without touching stored data
    fn clean(&self) -> StorageResult<()>;

    /// Remove every stored entry under the root
    fn wipe(&self) -> StorageResult<()>;

    fn register_listener(&self, listener: Arc<dyn StorageListener>);
}

/// Local filesystem storage provider
#[derive(Debug)]
pub struct FileStorage {
    settings: Settings,
    notifier: EventNotifier,
}

impl FileStorage {
    pub fn new(settings: Settings) -> Self {
        info!(
            "File storage initialized (root: {}, tmp: {})",
            settings.root_str(),
            settings.tmp_str()
        );
        Self {
            settings,
            notifier: EventNotifier::new(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    fn root(&self) -> &Path {
        &self.settings.root
    }

    /// Fire the success event or the error event for `result`
    fn report<T>(
        &self,
        operation: Operation,
        result: StorageResult<T>,
        event: impl FnOnce(&T) -> Option<StorageEvent>,
    ) -> StorageResult<T> {
        match &result {
            Ok(value) => {
                if let Some(event) = event(value) {
                    self.notifier.notify(&event);
                }
            }
            Err(error) => self.notifier.notify(&StorageEvent::Error {
                operation,
                error: error.clone(),
            }),
        }
        result
    }

    fn do_store(&self, source: &Path, target: Option<&str>) -> StorageResult<(PathBuf, PathBuf)> {
        validate_root(&self.settings)?;

        if source.is_dir() {
            return Err(StorageError::InvalidOperation(format!(
                "{} is a folder. You should call create_folder",
                source.display()
            )));
        }

        let directory = resolve_within_root(self.root(), target.unwrap_or(""))?;
        let destination = filesystem::copy_file_to_directory(source, &directory)?;

        info!(
            "Stored {} at {}",
            source.display(),
            destination.display()
        );
        Ok((source.to_path_buf(), destination))
    }

    fn do_remove_file(&self, path: &str) -> StorageResult<PathBuf> {
        validate_path(path)?;
        validate_root(&self.settings)?;

        let target = resolve_within_root(self.root(), path)?;

        if target.is_dir() {
            return Err(StorageError::InvalidOperation(format!(
                "{} is a folder. You should call remove_folder",
                display_name(&target)
            )));
        }

        if !target.exists() {
            return Err(StorageError::NotFound(format!("{} doesn't exist", path)));
        }

        filesystem::force_delete(&target)?;
        info!("Removed file {} (logical: {})", target.display(), path);
        Ok(target)
    }

    fn do_create_folder(&self, path: &str) -> StorageResult<Option<PathBuf>> {
        validate_path(path)?;
        validate_root(&self.settings)?;

        if path.trim().is_empty() || normalize_logical_path(path)?.as_os_str().is_empty() {
            debug!("create_folder on the root is a no-op");
            return Ok(None);
        }

        let target = resolve_within_root(self.root(), path)?;
        if target.exists() {
            debug!("Folder {} already exists", target.display());
            return Ok(None);
        }

        filesystem::create_directory(&target)?;
        info!("Created folder {} (logical: {})", target.display(), path);
        Ok(Some(target))
    }

    fn do_remove_folder(&self, path: &str) -> StorageResult<Option<PathBuf>> {
        validate_path(path)?;
        validate_root(&self.settings)?;

        // Never delete the root itself.
        if path.trim().is_empty() || normalize_logical_path(path)?.as_os_str().is_empty() {
            debug!("remove_folder on the root is a no-op");
            return Ok(None);
        }

        let target = resolve_within_root(self.root(), path)?;

        if !target.exists() {
            return Err(StorageError::NotFound(format!("{} doesn't exist", path)));
        }

        if !target.is_dir() {
            return Err(StorageError::InvalidOperation(format!(
                "{} is a file. You should call remove_file",
                display_name(&target)
            )));
        }

        filesystem::force_delete(&target)?;
        info!("Removed folder {} (logical: {})", target.display(), path);
        Ok(Some(target))
    }

    fn do_retrieve(&self, path: &str) -> StorageResult<Option<(PathBuf, StagedFile)>> {
        validate_path(path)?;
        validate_root(&self.settings)?;

        if path.trim().is_empty() {
            return Ok(None);
        }

        let target = resolve_within_root(self.root(), path)?;

        if !target.exists() {
            return Err(StorageError::NotFound(format!(
                "{} doesn't exist",
                display_name(&target)
            )));
        }

        if target.is_dir() {
            return Err(StorageError::InvalidOperation(format!(
                "{} is a folder",
                display_name(&target)
            )));
        }

        let staged = staging::stage_file(&self.settings.tmp, &target, path)?;
        info!(
            "Retrieved {} into {}",
            target.display(),
            staged.path().display()
        );
        Ok(Some((target, staged)))
    }

    fn do_wipe(&self) -> StorageResult<PathBuf> {
        validate_root(&self.settings)?;
        let removed = filesystem::clean_directory(self.root())?;
        info!("Wiped {} entries from {}", removed, self.settings.root_str());
        Ok(self.root().to_path_buf())
    }
}

impl StorageProvider for FileStorage {
    fn store_file(&self, source: &Path, target: Option<&str>) -> StorageResult<()> {
        let result = self.do_store(source, target);
        self.report(Operation::StoreFile, result, |(source, destination)| {
            Some(StorageEvent::FileStored {
                source: source.clone(),
                destination: destination.clone(),
            })
        })
        .map(|_| ())
    }

    fn remove_file(&self, path: &str) -> StorageResult<()> {
        let result = self.do_remove_file(path);
        self.report(Operation::RemoveFile, result, |path| {
            Some(StorageEvent::FileRemoved { path: path.clone() })
        })
        .map(|_| ())
    }

    fn create_folder(&self, path: &str) -> StorageResult<()> {
        let result = self.do_create_folder(path);
        self.report(Operation::CreateFolder, result, |created| {
            created
                .as_ref()
                .map(|path| StorageEvent::FolderCreated { path: path.clone() })
        })
        .map(|_| ())
    }

    fn remove_folder(&self, path: &str) -> StorageResult<()> {
        let result = self.do_remove_folder(path);
        self.report(Operation::RemoveFolder, result, |removed| {
            removed
                .as_ref()
                .map(|path| StorageEvent::FolderRemoved { path: path.clone() })
        })
        .map(|_| ())
    }

    fn retrieve_file(&self, path: &str) -> StorageResult<Option<StagedFile>> {
        let result = self.do_retrieve(path);
        self.report(Operation::RetrieveFile, result, |retrieved| {
            retrieved
                .as_ref()
                .map(|(path, staged)| StorageEvent::FileRetrieved {
                    path: path.clone(),
                    staged: staged.path().to_path_buf(),
                })
        })
        .map(|retrieved| retrieved.map(|(_, staged)| staged))
    }

    fn retrieve_file_as_stream(&self, path: &str) -> StorageResult<Box<dyn Read + Send>> {
        let staged = self.retrieve_file(path)?.ok_or_else(|| {
            StorageError::NotFound(format!("nothing to retrieve at '{}'", path))
        })?;

        match staged.open() {
            Ok(file) => Ok(Box::new(file)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StorageError::NotFound(
                format!("staged copy {} is missing", staged.path().display()),
            )),
            Err(e) => Err(e.into()),
        }
    }

    fn clean(&self) -> StorageResult<()> {
        let result = staging::clear_staging(&self.settings.tmp);
        self.report(Operation::Clean, result, |_| {
            Some(StorageEvent::Cleaned {
                tmp: self.settings.tmp.clone(),
            })
        })
        .map(|_| ())
    }

    fn wipe(&self) -> StorageResult<()> {
        let result = self.do_wipe();
        self.report(Operation::Wipe, result, |root| {
            Some(StorageEvent::Wiped { root: root.clone() })
        })
        .map(|_| ())
    }

    fn register_listener(&self, listener: Arc<dyn StorageListener>) {
        self.notifier.register(listener);
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
