//! Storage result types
//!
//! Defines values returned by storage operations.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

/// A retrieved file copied into the staging directory.
///
/// The caller owns the staged copy; the storage layer does not track it
/// beyond the next `clean`.
///
/// Copies are staged flat under tmp by file name. Retrieving `a/x.txt` and then
/// `b/x.txt` overwrites the first copy, and both handles point at the same file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    path: PathBuf,
    logical_path: String,
}

impl StagedFile {
    pub(crate) fn new(path: PathBuf, logical_path: impl Into<String>) -> Self {
        Self {
            path,
            logical_path: logical_path.into(),
        }
    }

    /// Location of the staged copy
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Logical path the copy was retrieved from
    pub fn logical_path(&self) -> &str {
        &self.logical_path
    }

    /// Open the staged copy for reading
    pub fn open(&self) -> io::Result<File> {
        File::open(&self.path)
    }

    pub fn into_path(self) -> PathBuf {
        self.path
    }
}

impl AsRef<Path> for StagedFile {
    fn as_ref(&self) -> &Path {
        &self.path
    }
}
