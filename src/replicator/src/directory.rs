use std::{fs, io::ErrorKind, path::Path};

use located_error::prelude::*;
use log::{debug, trace};

use crate::ReplicatorError;

/// Outcome of [`ensure_directory`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirStatus {
    Created,
    AlreadyExisted,
}

/// Recursively create `path`, along with any missing parent directory.
///
/// An already existing directory is not an error, and is left untouched.
///
/// # Errors
/// - `NotADirectory` if `path` already exists, but is not a directory.
/// - `CreateDirectory` for any other filesystem failure (e.g. `PermissionDenied`)
pub fn ensure_directory(path: impl AsRef<Path>) -> Result<DirStatus> {
    let path = path.as_ref();
    let loc_msg = || format!("While ensuring directory '{}' exists", path.display());

    if path.is_dir() {
        trace!("Directory {} already exists", path.display());
        return Ok(DirStatus::AlreadyExisted)
    }
    if path.exists() {
        return Err(ReplicatorError::NotADirectory(path.to_path_buf())).with_loc(loc_msg)
    }

    match fs::create_dir_all(path) {
        Ok(()) => {
            trace!("Created directory {}", path.display());
            Ok(DirStatus::Created)
        },
        // Lost a race against another process: still fine, as long as the result is a directory.
        Err(e) if e.kind() == ErrorKind::AlreadyExists && path.is_dir() => Ok(DirStatus::AlreadyExisted),
        Err(source) => Err(ReplicatorError::CreateDirectory{path: path.to_path_buf(), source}).with_loc(loc_msg),
    }
}

/// Ensure every directory of `paths` exists, and return how many were newly created.
///
/// # Errors
/// - Stops at, and returns, the first failure of [`ensure_directory`]
pub fn create_all<I, P>(paths: I) -> Result<usize>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let mut created = 0;
    for path in paths {
        if ensure_directory(path)? == DirStatus::Created {
            created += 1;
        }
    }
    debug!("Created {created} new directories");
    Ok(created)
}
