//! Path validation
//!
//! Structural checks on caller-supplied logical paths, root validation, and the
//! containment check that keeps every resolved path under the storage root.

use log::debug;
use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::config::Settings;
use crate::error::{StorageError, StorageResult};

/// Longest logical path accepted, in bytes
pub const MAX_PATH_LENGTH: usize = 4096;

/// Validate a logical path before it is combined with a root.
///
/// Empty and whitespace-only paths are valid; operations decide what they mean.
pub fn validate_path(path: &str) -> StorageResult<()> {
    if path.len() > MAX_PATH_LENGTH {
        return Err(StorageError::InvalidPath(format!(
            "path exceeds {} bytes",
            MAX_PATH_LENGTH
        )));
    }

    if path.contains('\0') || path.contains('\r') || path.contains('\n') {
        return Err(StorageError::InvalidPath(format!(
            "path contains control characters: {:?}",
            path
        )));
    }

    if path.split(['/', '\\']).any(|segment| segment.trim() == "..") {
        return Err(StorageError::InvalidPath(format!(
            "path traversal attempt: {}",
            path
        )));
    }

    Ok(())
}

/// Check that the configured root exists and is a directory
pub fn validate_root(settings: &Settings) -> StorageResult<()> {
    if !settings.root.exists() {
        return Err(StorageError::Configuration(format!(
            "root {} does not exist",
            settings.root.display()
        )));
    }

    if !settings.root.is_dir() {
        return Err(StorageError::Configuration(format!(
            "root {} is not a directory",
            settings.root.display()
        )));
    }

    Ok(())
}

/// Lexically normalize a logical path into a relative path.
///
/// Leading separators and `.` segments are dropped, so `"/docs/./a.txt"` becomes
/// `"docs/a.txt"`. An empty result addresses the root itself.
pub fn normalize_logical_path(path: &str) -> StorageResult<PathBuf> {
    validate_path(path)?;

    let mut normalized = PathBuf::new();
    for component in Path::new(path).components() {
        match component {
            Component::Normal(part) => normalized.push(part),
            Component::CurDir | Component::RootDir => {}
            Component::ParentDir => {
                return Err(StorageError::InvalidPath(format!(
                    "path traversal attempt: {}",
                    path
                )));
            }
            Component::Prefix(_) => {
                return Err(StorageError::InvalidPath(format!(
                    "path must be relative to the storage root: {}",
                    path
                )));
            }
        }
    }

    Ok(normalized)
}

/// Resolve a logical path against the root and make sure it stays inside it
pub fn resolve_within_root(root: &Path, path: &str) -> StorageResult<PathBuf> {
    let resolved = root.join(normalize_logical_path(path)?);
    ensure_within_root(root, &resolved)?;
    debug!("Resolved '{}' to {}", path, resolved.display());
    Ok(resolved)
}

/// Symlink hops followed while checking dangling links
const MAX_LINK_DEPTH: usize = 40;

/// Canonicalize the nearest existing ancestor of `target` and require it under `root`.
///
/// Lexical normalization cannot see symlinks; this catches links pointing out of the root.
/// A dangling link cannot be canonicalized, so its destination and its parent are checked instead.
pub fn ensure_within_root(root: &Path, target: &Path) -> StorageResult<()> {
    let canonical_root = root.canonicalize().map_err(|e| {
        StorageError::Configuration(format!("root {} is not accessible: {}", root.display(), e))
    })?;

    check_contained(&canonical_root, target, target, 0)
}

fn check_contained(
    canonical_root: &Path,
    requested: &Path,
    target: &Path,
    depth: usize,
) -> StorageResult<()> {
    let mut cursor = Some(target);
    while let Some(candidate) = cursor {
        if let Ok(metadata) = candidate.symlink_metadata() {
            match candidate.canonicalize() {
                Ok(canonical) if canonical.starts_with(canonical_root) => return Ok(()),
                Ok(_) => {
                    return Err(StorageError::InvalidPath(format!(
                        "{} resolves outside the storage root",
                        requested.display()
                    )));
                }
                Err(_) if metadata.file_type().is_symlink() && depth < MAX_LINK_DEPTH => {
                    let link = fs::read_link(candidate)?;
                    let destination = match candidate.parent() {
                        Some(parent) => parent.join(link),
                        None => link,
                    };
                    debug!(
                        "Dangling link {} points to {}",
                        candidate.display(),
                        destination.display()
                    );
                    check_contained(canonical_root, requested, &destination, depth + 1)?;
                }
                Err(e) => return Err(StorageError::from(e)),
            }
        }
        cursor = candidate.parent();
    }

    Err(StorageError::InvalidPath(format!(
        "{} has no existing ancestor under the storage root",
        requested.display()
    )))
}
