use crate::error::TidyError;
use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Files and directories found under a traversal root.
///
/// Paths are joined onto the root. Emission order is depth-first, pre-order,
/// with the entries of every directory sorted by file name, so the order is
/// stable for a given tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TraverseResult {
    pub files: Vec<PathBuf>,
    pub dirs: Vec<PathBuf>,
}

/// Symbolic links are never followed and never reported.
pub fn traverse(root: &Path, recursive: bool) -> Result<TraverseResult, TidyError> {
    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut result = TraverseResult::default();

    for entry in WalkDir::new(root)
        .max_depth(max_depth)
        .follow_links(false)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) if err.depth() == 0 => {
                return Err(TidyError::Traversal {
                    path: root.to_path_buf(),
                    source: io::Error::from(err),
                });
            }
            Err(err) => {
                warn!(root = %root.display(), error = %err, "skipping unreadable entry");
                continue;
            }
        };

        let file_type = entry.file_type();
        if entry.depth() == 0 {
            if !file_type.is_dir() {
                return Err(TidyError::Traversal {
                    path: root.to_path_buf(),
                    source: io::Error::new(io::ErrorKind::NotADirectory, "ディレクトリではありません"),
                });
            }
            continue;
        }

        if file_type.is_file() {
            result.files.push(entry.into_path());
        } else if file_type.is_dir() {
            result.dirs.push(entry.into_path());
        }
    }

    debug!(
        root = %root.display(),
        recursive,
        files = result.files.len(),
        dirs = result.dirs.len(),
        "traversed"
    );
    Ok(result)
}
