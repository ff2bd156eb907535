//! Temporary staging
//!
//! Retrieved files are copied into the tmp directory so callers hold a handle
//! independent of the storage root.

use log::{debug, info};
use std::path::Path;

use crate::error::StorageResult;
use crate::storage::filesystem;
use crate::storage::results::StagedFile;

/// Copy `source` into `tmp` and hand back the staged copy
pub fn stage_file(tmp: &Path, source: &Path, logical_path: &str) -> StorageResult<StagedFile> {
    let staged = filesystem::copy_file_to_directory(source, tmp)?;
    debug!(
        "Staged {} (logical: {}) at {}",
        source.display(),
        logical_path,
        staged.display()
    );
    Ok(StagedFile::new(staged, logical_path))
}

/// Remove every staged file; a missing tmp directory means nothing to clean
pub fn clear_staging(tmp: &Path) -> StorageResult<usize> {
    if !tmp.exists() {
        debug!("Staging directory {} does not exist, nothing to clean", tmp.display());
        return Ok(0);
    }

    let removed = filesystem::clean_directory(tmp)?;
    info!("Cleaned {} staged entries from {}", removed, tmp.display());
    Ok(removed)
}
