//! File system operations
//!
//! The primitive layer the provider orchestrates: copy, delete, mkdir and
//! directory cleaning. Failures surface as plain `io::Error`.

use std::fs;
use std::io::{Error, ErrorKind, Result};
use std::path::{Path, PathBuf};

/// Copy `file` into `directory`, keeping its name and replacing any existing file.
///
/// The destination directory chain is created when missing.
pub fn copy_file_to_directory(file: &Path, directory: &Path) -> Result<PathBuf> {
    let name = file.file_name().ok_or_else(|| {
        Error::new(
            ErrorKind::InvalidInput,
            format!("{} has no file name", file.display()),
        )
    })?;

    if !file.exists() {
        return Err(Error::new(
            ErrorKind::NotFound,
            format!("source {} does not exist", file.display()),
        ));
    }

    if directory.exists() && !directory.is_dir() {
        return Err(Error::new(
            ErrorKind::AlreadyExists,
            format!("destination {} exists but is not a directory", directory.display()),
        ));
    }

    fs::create_dir_all(directory)?;

    let destination = directory.join(name);
    if destination.exists() && file.canonicalize()? == destination.canonicalize()? {
        return Err(Error::new(
            ErrorKind::InvalidInput,
            format!(
                "source and destination are the same: {}",
                destination.display()
            ),
        ));
    }

    fs::copy(file, &destination)?;
    Ok(destination)
}

/// Delete a file, or a directory with everything under it
pub fn force_delete(path: &Path) -> Result<()> {
    let metadata = fs::symlink_metadata(path)?;
    if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}

/// Create a single directory; the parent must already exist
pub fn create_directory(path: &Path) -> Result<()> {
    fs::create_dir(path)
}

/// Remove every entry inside `directory`, keeping the directory itself
pub fn clean_directory(directory: &Path) -> Result<usize> {
    let mut removed = 0;
    for entry in fs::read_dir(directory)? {
        force_delete(&entry?.path())?;
        removed += 1;
    }
    Ok(removed)
}
