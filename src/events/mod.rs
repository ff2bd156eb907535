//! Event notification
//!
//! Outcome events for storage operations and the listeners that observe them.

mod listener;
mod notifier;
mod types;

pub use listener::{LoggingListener, StorageListener};
pub use notifier::EventNotifier;
pub use types::{Operation, StorageEvent};
