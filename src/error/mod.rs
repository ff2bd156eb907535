//! Error handling
//!
//! Defines the storage error taxonomy and helpers for reporting it.

pub mod handlers;
pub mod types;

pub use types::*;
