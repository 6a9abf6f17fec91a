use crate::error::TidyError;
use crate::executor::{remove_file, safe_remove_dir, RemoveDirOutcome};
use crate::flatten::ensure_dir;
use crate::report::{ActionKind, OperationReport, Outcome};
use crate::traverse::traverse;
use rayon::prelude::*;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

#[derive(Debug, Clone, Copy, Default)]
pub struct CleanupOptions {
    pub recursive: bool,
    pub dry_run: bool,
}

/// Removes zero-byte files. Sizes are read in parallel; removals run in
/// traversal order afterwards.
pub fn remove_empty_files(
    root: &Path,
    options: &CleanupOptions,
) -> Result<OperationReport, TidyError> {
    let scanned = traverse(root, options.recursive)?;
    let sizes: Vec<(&PathBuf, io::Result<u64>)> = scanned
        .files
        .par_iter()
        .map(|path| (path, fs::metadata(path).map(|m| m.len())))
        .collect();

    let mut report = OperationReport::new(options.dry_run);
    for (path, size) in sizes {
        match size {
            Ok(0) if options.dry_run => {
                report.record(ActionKind::RemoveFile, path, None, Outcome::Planned, None)
            }
            Ok(0) => match remove_file(path) {
                Ok(()) => report.record(ActionKind::RemoveFile, path, None, Outcome::Done, None),
                Err(err) => {
                    warn!(error = %err, "remove failed");
                    report.record_failure(ActionKind::RemoveFile, path, None, err)
                }
            },
            Ok(_) => {}
            Err(source) => {
                let err = TidyError::Metadata {
                    path: path.clone(),
                    source,
                };
                warn!(error = %err, "cannot check file size");
                report.record_failure(ActionKind::RemoveFile, path, None, err);
            }
        }
    }

    info!(root = %root.display(), summary = %report.summary(), "empty file cleanup finished");
    Ok(report)
}

/// Removes empty directories, children first, including `root` itself.
///
/// A directory whose only entries were removed earlier in the same run
/// counts as empty. In dry-run mode planned removals count the same way, so
/// the report matches what a live run would do. Without `recursive` only
/// `root` is considered.
pub fn remove_empty_dirs(
    root: &Path,
    options: &CleanupOptions,
) -> Result<OperationReport, TidyError> {
    ensure_dir(root)?;
    let max_depth = if options.recursive { usize::MAX } else { 0 };
    let mut report = OperationReport::new(options.dry_run);
    let mut gone = HashSet::<PathBuf>::new();

    for entry in WalkDir::new(root)
        .max_depth(max_depth)
        .follow_links(false)
        .contents_first(true)
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
                warn!(error = %err, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_dir() {
            continue;
        }

        let dir = entry.path();
        match is_effectively_empty(dir, &gone) {
            Ok(true) => {}
            Ok(false) => continue,
            Err(err) => {
                report.record_failure(ActionKind::RemoveDir, dir, None, err);
                continue;
            }
        }

        if options.dry_run {
            report.record(ActionKind::RemoveDir, dir, None, Outcome::Planned, None);
            gone.insert(dir.to_path_buf());
            continue;
        }
        match safe_remove_dir(dir) {
            Ok(RemoveDirOutcome::Removed) => {
                report.record(ActionKind::RemoveDir, dir, None, Outcome::Done, None);
                gone.insert(dir.to_path_buf());
            }
            Ok(RemoveDirOutcome::NotEmpty) => report.record(
                ActionKind::RemoveDir,
                dir,
                None,
                Outcome::Skipped,
                Some("空ではありません".to_string()),
            ),
            Err(err) => report.record_failure(ActionKind::RemoveDir, dir, None, err),
        }
    }

    info!(root = %root.display(), summary = %report.summary(), "empty directory cleanup finished");
    Ok(report)
}

fn is_effectively_empty(dir: &Path, gone: &HashSet<PathBuf>) -> Result<bool, TidyError> {
    let io_err = |source| TidyError::Io {
        path: dir.to_path_buf(),
        source,
    };
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        if !gone.contains(&entry.path()) {
            return Ok(false);
        }
    }
    Ok(true)
}
