use crate::error::TidyError;
use std::fs;
use std::io;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveDirOutcome {
    Removed,
    NotEmpty,
}

/// Renames `from` to `to` without ever replacing an existing path.
///
/// Equal paths are a no-op. An occupied destination fails with
/// [`TidyError::DestinationExists`] and leaves `from` untouched. The move
/// itself is a single `rename` call, so it never crosses filesystems.
///
/// The existence check and the rename are two separate calls; callers that
/// target the same directory must not run them concurrently.
pub fn safe_rename(from: &Path, to: &Path) -> Result<(), TidyError> {
    if from == to {
        return Ok(());
    }

    match fs::symlink_metadata(to) {
        Ok(_) => {
            return Err(TidyError::DestinationExists {
                from: from.to_path_buf(),
                to: to.to_path_buf(),
            });
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(source) => {
            return Err(TidyError::Io {
                path: to.to_path_buf(),
                source,
            });
        }
    }

    fs::rename(from, to).map_err(|source| TidyError::Io {
        path: from.to_path_buf(),
        source,
    })?;
    debug!(from = %from.display(), to = %to.display(), "renamed");
    Ok(())
}

/// Removes an empty directory. A directory that still has contents is left
/// alone and reported as [`RemoveDirOutcome::NotEmpty`].
pub fn safe_remove_dir(path: &Path) -> Result<RemoveDirOutcome, TidyError> {
    match fs::remove_dir(path) {
        Ok(()) => {
            debug!(path = %path.display(), "removed directory");
            Ok(RemoveDirOutcome::Removed)
        }
        Err(err) if err.kind() == io::ErrorKind::DirectoryNotEmpty => {
            debug!(path = %path.display(), "directory not empty, kept");
            Ok(RemoveDirOutcome::NotEmpty)
        }
        Err(source) => Err(TidyError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

pub fn remove_file(path: &Path) -> Result<(), TidyError> {
    fs::remove_file(path).map_err(|source| TidyError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), "removed file");
    Ok(())
}
