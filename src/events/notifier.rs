//! Listener registry and dispatch

use log::warn;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, RwLock};

use crate::events::listener::StorageListener;
use crate::events::types::StorageEvent;

/// Registry of listeners, notified synchronously in registration order
#[derive(Default)]
pub struct EventNotifier {
    listeners: RwLock<Vec<Arc<dyn StorageListener>>>,
}

impl EventNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, listener: Arc<dyn StorageListener>) {
        let mut listeners = self
            .listeners
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        listeners.push(listener);
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deliver `event` to every listener.
    ///
    /// A panicking listener is logged and skipped; the rest still receive the event.
    pub fn notify(&self, event: &StorageEvent) {
        for (index, listener) in self.snapshot().iter().enumerate() {
            if catch_unwind(AssertUnwindSafe(|| listener.on_event(event))).is_err() {
                warn!(
                    "Storage listener #{} panicked while handling '{}'",
                    index,
                    event.operation()
                );
            }
        }
    }

    // Dispatch runs on a copy so listeners may register further listeners.
    fn snapshot(&self) -> Vec<Arc<dyn StorageListener>> {
        self.listeners
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl std::fmt::Debug for EventNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventNotifier")
            .field("listeners", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;
    use crate::events::types::Operation;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;

    struct Recorder {
        name: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl StorageListener for Recorder {
        fn on_folder_created(&self, path: &Path) {
            self.log
                .lock()
                .unwrap()
                .push(format!("{}:{}", self.name, path.display()));
        }
    }

    struct Panicker;

    impl StorageListener for Panicker {
        fn on_event(&self, _event: &StorageEvent) {
            panic!("listener failure");
        }
    }

    struct ErrorsOnly(Arc<Mutex<Vec<Operation>>>);

    impl StorageListener for ErrorsOnly {
        fn on_error(&self, operation: Operation, _error: &StorageError) {
            self.0.lock().unwrap().push(operation);
        }
    }

    fn folder_event() -> StorageEvent {
        StorageEvent::FolderCreated {
            path: PathBuf::from("/storage/x"),
        }
    }

    #[test]
    fn dispatches_in_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let notifier = EventNotifier::new();
        notifier.register(Arc::new(Recorder {
            name: "first",
            log: log.clone(),
        }));
        notifier.register(Arc::new(Recorder {
            name: "second",
            log: log.clone(),
        }));

        notifier.notify(&folder_event());

        assert_eq!(
            *log.lock().unwrap(),
            vec!["first:/storage/x", "second:/storage/x"]
        );
    }

    #[test]
    fn panicking_listener_does_not_stop_dispatch() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let notifier = EventNotifier::new();
        notifier.register(Arc::new(Panicker));
        notifier.register(Arc::new(Recorder {
            name: "after",
            log: log.clone(),
        }));

        notifier.notify(&folder_event());

        assert_eq!(*log.lock().unwrap(), vec!["after:/storage/x"]);
    }

    #[test]
    fn default_hooks_ignore_other_events() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let notifier = EventNotifier::new();
        notifier.register(Arc::new(ErrorsOnly(seen.clone())));

        notifier.notify(&folder_event());
        notifier.notify(&StorageEvent::Error {
            operation: Operation::Wipe,
            error: StorageError::Io("boom".into()),
        });

        assert_eq!(*seen.lock().unwrap(), vec![Operation::Wipe]);
    }

    #[test]
    fn empty_registry_is_fine() {
        let notifier = EventNotifier::new();
        assert!(notifier.is_empty());
        notifier.notify(&folder_event());
    }
}
