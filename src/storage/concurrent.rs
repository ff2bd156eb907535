//! Concurrent access
//!
//! `AsyncStorage` wraps any provider for use from async code. Operations on the
//! same logical path are serialized; operations on different paths run in
//! parallel; `clean` and `wipe` run alone. Provider calls happen on tokio's
//! blocking pool.

use log::debug;
use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex as StdMutex, MutexGuard};
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use crate::error::{StorageError, StorageResult};
use crate::events::StorageListener;
use crate::storage::provider::StorageProvider;
use crate::storage::results::StagedFile;
use crate::storage::validation::normalize_logical_path;

/// Per-path lock table
#[derive(Default)]
struct PathLocks {
    global: Arc<RwLock<()>>,
    paths: StdMutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl PathLocks {
    fn table(&self) -> MutexGuard<'_, HashMap<PathBuf, Arc<Mutex<()>>>> {
        self.paths
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn len(&self) -> usize {
        self.table().len()
    }
}

/// Exclusive hold on one path. Dropping it unlocks the path and prunes the
/// table entry once nobody else is waiting, including when the caller is cancelled.
struct PathLease {
    locks: Arc<PathLocks>,
    key: PathBuf,
    guard: Option<OwnedMutexGuard<()>>,
}

impl PathLease {
    async fn acquire(locks: &Arc<PathLocks>, key: PathBuf) -> Self {
        let lock = Arc::clone(
            locks
                .table()
                .entry(key.clone())
                .or_insert_with(|| Arc::new(Mutex::new(()))),
        );

        let mut lease = Self {
            locks: Arc::clone(locks),
            key,
            guard: None,
        };
        lease.guard = Some(lock.lock_owned().await);
        lease
    }
}

impl Drop for PathLease {
    fn drop(&mut self) {
        self.guard.take();
        let mut paths = self.locks.table();
        // Only the table still holds the lock: nobody is waiting on it.
        if paths
            .get(&self.key)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            paths.remove(&self.key);
        }
    }
}

/// Async facade with per-path mutual exclusion over a [`StorageProvider`]
pub struct AsyncStorage<P> {
    provider: Arc<P>,
    locks: Arc<PathLocks>,
}

impl<P> Clone for AsyncStorage<P> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
            locks: Arc::clone(&self.locks),
        }
    }
}

impl<P: StorageProvider + 'static> AsyncStorage<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider: Arc::new(provider),
            locks: Arc::new(PathLocks::default()),
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn register_listener(&self, listener: Arc<dyn StorageListener>) {
        self.provider.register_listener(listener);
    }

    /// Run `op` on the blocking pool while holding the lock for `key`.
    ///
    /// The guards travel with the blocking task, so a dropped caller future
    /// leaves the path locked until the provider call has finished.
    async fn with_path<T, F>(&self, key: PathBuf, op: F) -> StorageResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&P) -> StorageResult<T> + Send + 'static,
    {
        let shared = Arc::clone(&self.locks.global).read_owned().await;
        let lease = PathLease::acquire(&self.locks, key).await;
        debug!("Acquired storage lock for '{}'", lease.key.display());

        self.run_blocking(move |provider| {
            let _held = (shared, lease);
            op(provider)
        })
        .await
    }

    /// Run `op` on the blocking pool with no other operation in flight
    async fn exclusive<T, F>(&self, op: F) -> StorageResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&P) -> StorageResult<T> + Send + 'static,
    {
        let exclusive = Arc::clone(&self.locks.global).write_owned().await;
        self.run_blocking(move |provider| {
            let _held = exclusive;
            op(provider)
        })
        .await
    }

    async fn run_blocking<T, F>(&self, op: F) -> StorageResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&P) -> StorageResult<T> + Send + 'static,
    {
        let provider = Arc::clone(&self.provider);
        tokio::task::spawn_blocking(move || op(provider.as_ref()))
            .await
            .map_err(|e| StorageError::Io(format!("storage task failed: {}", e)))?
    }

    pub async fn store_file(&self, source: PathBuf, target: Option<String>) -> StorageResult<()> {
        let key = destination_key(&source, target.as_deref())?;
        self.with_path(key, move |provider| {
            provider.store_file(&source, target.as_deref())
        })
        .await
    }

    pub async fn store_path(&self, source: String, target: Option<String>) -> StorageResult<()> {
        let key = destination_key(Path::new(&source), target.as_deref())?;
        self.with_path(key, move |provider| {
            provider.store_path(&source, target.as_deref())
        })
        .await
    }

    pub async fn remove_file(&self, path: String) -> StorageResult<()> {
        let key = normalize_logical_path(&path)?;
        self.with_path(key, move |provider| provider.remove_file(&path))
            .await
    }

    pub async fn create_folder(&self, path: String) -> StorageResult<()> {
        let key = normalize_logical_path(&path)?;
        self.with_path(key, move |provider| provider.create_folder(&path))
            .await
    }

    pub async fn remove_folder(&self, path: String) -> StorageResult<()> {
        let key = normalize_logical_path(&path)?;
        self.with_path(key, move |provider| provider.remove_folder(&path))
            .await
    }

    pub async fn retrieve_file(&self, path: String) -> StorageResult<Option<StagedFile>> {
        let key = normalize_logical_path(&path)?;
        self.with_path(key, move |provider| provider.retrieve_file(&path))
            .await
    }

    pub async fn retrieve_file_as_stream(
        &self,
        path: String,
    ) -> StorageResult<Box<dyn Read + Send>> {
        let key = normalize_logical_path(&path)?;
        self.with_path(key, move |provider| provider.retrieve_file_as_stream(&path))
            .await
    }

    pub async fn clean(&self) -> StorageResult<()> {
        self.exclusive(|provider| provider.clean()).await
    }

    pub async fn wipe(&self) -> StorageResult<()> {
        self.exclusive(|provider| provider.wipe()).await
    }

    /// Number of path locks currently tracked
    pub fn tracked_locks(&self) -> usize {
        self.locks.len()
    }
}

/// Lock key for a store: the destination file inside the target folder
fn destination_key(source: &Path, target: Option<&str>) -> StorageResult<PathBuf> {
    let mut key = normalize_logical_path(target.unwrap_or(""))?;
    if let Some(name) = source.file_name() {
        key.push(name);
    }
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::storage::provider::FileStorage;
    use std::fs;
    use std::time::Duration;

    fn storage(root: &Path, tmp: &Path) -> AsyncStorage<FileStorage> {
        AsyncStorage::new(FileStorage::new(Settings::new(root, tmp).unwrap()))
    }

    #[tokio::test]
    async fn concurrent_stores_to_same_destination_all_succeed() {
        let root = tempfile::tempdir().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        let sources = tempfile::tempdir().unwrap();
        let storage = storage(root.path(), tmp.path());

        let mut handles = Vec::new();
        for i in 0..8 {
            let dir = sources.path().join(i.to_string());
            fs::create_dir(&dir).unwrap();
            let source = dir.join("shared.txt");
            fs::write(&source, format!("writer {i}")).unwrap();

            let storage = storage.clone();
            handles.push(tokio::spawn(async move {
                storage.store_file(source, Some("docs".into())).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let content = fs::read_to_string(root.path().join("docs/shared.txt")).unwrap();
        assert!(content.starts_with("writer "));
        assert_eq!(storage.tracked_locks(), 0);
    }

    #[tokio::test]
    async fn concurrent_create_folder_is_idempotent() {
        let root = tempfile::tempdir().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        let storage = storage(root.path(), tmp.path());

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let storage = storage.clone();
                tokio::spawn(async move { storage.create_folder("shared".into()).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert!(root.path().join("shared").is_dir());
    }

    #[tokio::test]
    async fn invalid_path_fails_before_locking() {
        let root = tempfile::tempdir().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        let storage = storage(root.path(), tmp.path());

        let err = storage.remove_folder("../x".into()).await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidPath(_)));
        assert_eq!(storage.tracked_locks(), 0);
    }

    #[tokio::test]
    async fn wipe_and_clean_run_exclusively() {
        let root = tempfile::tempdir().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        let storage = storage(root.path(), tmp.path());

        storage.create_folder("a".into()).await.unwrap();
        fs::write(root.path().join("a/f.txt"), "x").unwrap();
        let staged = storage.retrieve_file("a/f.txt".into()).await.unwrap().unwrap();
        assert!(staged.path().is_file());

        storage.clean().await.unwrap();
        assert!(!staged.path().exists());

        storage.wipe().await.unwrap();
        assert_eq!(fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn store_path_stores_under_target() {
        let root = tempfile::tempdir().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        let sources = tempfile::tempdir().unwrap();
        let source = sources.path().join("report.txt");
        fs::write(&source, "quarterly").unwrap();
        let storage = storage(root.path(), tmp.path());

        storage
            .store_path(source.display().to_string(), Some("reports".into()))
            .await
            .unwrap();

        let stored = root.path().join("reports/report.txt");
        assert_eq!(fs::read_to_string(stored).unwrap(), "quarterly");
        assert_eq!(storage.tracked_locks(), 0);
    }

    #[tokio::test]
    async fn store_path_rejects_traversal_target() {
        let root = tempfile::tempdir().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        let storage = storage(root.path(), tmp.path());

        let err = storage
            .store_path("anything.txt".into(), Some("../outside".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidPath(_)));
    }

    #[tokio::test]
    async fn retrieve_file_as_stream_reads_content() {
        let root = tempfile::tempdir().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir(root.path().join("docs")).unwrap();
        fs::write(root.path().join("docs/notes.txt"), "stream me").unwrap();
        let storage = storage(root.path(), tmp.path());

        let mut reader = storage
            .retrieve_file_as_stream("docs/notes.txt".into())
            .await
            .unwrap();
        let mut content = String::new();
        reader.read_to_string(&mut content).unwrap();

        assert_eq!(content, "stream me");
        assert_eq!(storage.tracked_locks(), 0);

        let err = storage
            .retrieve_file_as_stream("docs/missing.txt".into())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    struct SlowListener;

    impl StorageListener for SlowListener {
        fn on_folder_created(&self, _path: &Path) {
            std::thread::sleep(Duration::from_millis(200));
        }
    }

    #[tokio::test]
    async fn cancelled_caller_keeps_path_locked_until_operation_ends() {
        let root = tempfile::tempdir().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        let storage = storage(root.path(), tmp.path());
        storage.register_listener(Arc::new(SlowListener));

        let timed_out = tokio::time::timeout(
            Duration::from_millis(20),
            storage.create_folder("slow".into()),
        )
        .await;
        assert!(timed_out.is_err());
        assert_eq!(storage.tracked_locks(), 1);

        // Waits for the abandoned operation, then finds the folder in place.
        storage.create_folder("slow".into()).await.unwrap();
        assert!(root.path().join("slow").is_dir());
        assert_eq!(storage.tracked_locks(), 0);
    }
}
