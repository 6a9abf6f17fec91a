use crate::error::TidyError;
use crate::executor::{safe_remove_dir, safe_rename, RemoveDirOutcome};
use crate::report::{ActionKind, OperationReport, Outcome};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

#[derive(Debug, Clone, Copy, Default)]
pub struct FlattenOptions {
    /// Without this only the direct subdirectories of the root are emptied.
    pub recursive: bool,
    pub dry_run: bool,
}

/// Moves every file found in subdirectories of `root` up into `root` and
/// removes the emptied subdirectories.
///
/// Subdirectories are processed children first. A file whose name is
/// already taken at the root stays where it is and is reported as failed;
/// its directory is then kept because it is not empty.
pub fn flatten(root: &Path, options: &FlattenOptions) -> Result<OperationReport, TidyError> {
    ensure_dir(root)?;
    let max_depth = if options.recursive { usize::MAX } else { 1 };
    let mut report = OperationReport::new(options.dry_run);

    for entry in WalkDir::new(root)
        .min_depth(1)
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
        if entry.file_type().is_dir() {
            flatten_dir(root, entry.path(), options.dry_run, &mut report);
        }
    }

    let summary = report.summary();
    info!(
        root = %root.display(),
        dry_run = options.dry_run,
        done = summary.done,
        failed = summary.failed,
        "flatten finished"
    );
    Ok(report)
}

fn flatten_dir(root: &Path, dir: &Path, dry_run: bool, report: &mut OperationReport) {
    let files = match direct_files(dir) {
        Ok(files) => files,
        Err(err) => {
            warn!(error = %err, "cannot list directory");
            report.record_failure(ActionKind::Move, dir, None, err);
            return;
        }
    };

    for file in files {
        let Some(name) = file.file_name() else {
            continue;
        };
        let target = root.join(name);
        if dry_run {
            report.record(ActionKind::Move, &file, Some(target.as_path()), Outcome::Planned, None);
            continue;
        }
        match safe_rename(&file, &target) {
            Ok(()) => {
                report.record(ActionKind::Move, &file, Some(target.as_path()), Outcome::Done, None);
            }
            Err(err) => {
                warn!(error = %err, "move failed");
                report.record_failure(ActionKind::Move, &file, Some(target.as_path()), err);
            }
        }
    }

    if dry_run {
        report.record(ActionKind::RemoveDir, dir, None, Outcome::Planned, None);
        return;
    }
    match safe_remove_dir(dir) {
        Ok(RemoveDirOutcome::Removed) => {
            report.record(ActionKind::RemoveDir, dir, None, Outcome::Done, None);
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

/// Regular files directly inside `dir`, sorted by name. Links are skipped.
fn direct_files(dir: &Path) -> Result<Vec<PathBuf>, TidyError> {
    let io_err = |source| TidyError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        if entry.file_type().map_err(io_err)?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

pub(crate) fn ensure_dir(root: &Path) -> Result<(), TidyError> {
    let metadata = fs::metadata(root).map_err(|source| TidyError::Traversal {
        path: root.to_path_buf(),
        source,
    })?;
    if !metadata.is_dir() {
        return Err(TidyError::Traversal {
            path: root.to_path_buf(),
            source: io::Error::new(io::ErrorKind::NotADirectory, "ディレクトリではありません"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn flattens_subdirectories_into_root() {
        let temp = tempdir().expect("tempdir");
        let root = temp.path();
        fs::create_dir_all(root.join("a")).expect("create a");
        fs::create_dir_all(root.join("b")).expect("create b");
        fs::write(root.join("a").join("x.txt"), b"x").expect("write x");
        fs::write(root.join("b").join("y.txt"), b"y").expect("write y");

        let report = flatten(
            root,
            &FlattenOptions {
                recursive: true,
                dry_run: false,
            },
        )
        .expect("flatten");

        assert!(root.join("x.txt").exists());
        assert!(root.join("y.txt").exists());
        assert!(!root.join("a").exists());
        assert!(!root.join("b").exists());
        assert!(!report.has_failures());
        assert_eq!(report.summary().done, 4);
    }

    #[test]
    fn collision_keeps_second_file_in_place() {
        let temp = tempdir().expect("tempdir");
        let root = temp.path();
        fs::create_dir_all(root.join("a")).expect("create a");
        fs::create_dir_all(root.join("b")).expect("create b");
        fs::write(root.join("a").join("x.txt"), b"from a").expect("write a/x");
        fs::write(root.join("b").join("x.txt"), b"from b").expect("write b/x");

        let report = flatten(
            root,
            &FlattenOptions {
                recursive: true,
                dry_run: false,
            },
        )
        .expect("flatten must not abort on collision");

        assert_eq!(fs::read(root.join("x.txt")).expect("read x"), b"from a");
        assert_eq!(fs::read(root.join("b").join("x.txt")).expect("read b/x"), b"from b");
        assert!(!root.join("a").exists());
        assert!(root.join("b").exists());

        let failed: Vec<_> = report.with_outcome(Outcome::Failed).collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].path, root.join("b").join("x.txt"));
        assert_eq!(report.summary().skipped, 1);
    }

    #[test]
    fn nested_directories_flatten_to_top_level_root() {
        let temp = tempdir().expect("tempdir");
        let root = temp.path();
        let deep = root.join("a").join("b").join("c");
        fs::create_dir_all(&deep).expect("create deep");
        fs::write(deep.join("deep.txt"), b"d").expect("write deep");
        fs::write(root.join("a").join("top.txt"), b"t").expect("write top");

        flatten(
            root,
            &FlattenOptions {
                recursive: true,
                dry_run: false,
            },
        )
        .expect("flatten");

        assert!(root.join("deep.txt").exists());
        assert!(root.join("top.txt").exists());
        assert!(!root.join("a").exists());
    }

    #[test]
    fn non_recursive_only_empties_direct_children() {
        let temp = tempdir().expect("tempdir");
        let root = temp.path();
        fs::create_dir_all(root.join("a").join("inner")).expect("create inner");
        fs::write(root.join("a").join("x.txt"), b"x").expect("write x");
        fs::write(root.join("a").join("inner").join("y.txt"), b"y").expect("write y");

        let report = flatten(root, &FlattenOptions::default()).expect("flatten");

        assert!(root.join("x.txt").exists());
        assert!(root.join("a").join("inner").join("y.txt").exists());
        assert_eq!(report.summary().skipped, 1);
    }

    #[test]
    fn dry_run_reports_without_moving() {
        let temp = tempdir().expect("tempdir");
        let root = temp.path();
        fs::create_dir_all(root.join("a").join("b")).expect("create a/b");
        fs::write(root.join("a").join("x.txt"), b"x").expect("write x");
        fs::write(root.join("a").join("b").join("y.txt"), b"y").expect("write y");

        let report = flatten(
            root,
            &FlattenOptions {
                recursive: true,
                dry_run: true,
            },
        )
        .expect("flatten");

        assert!(root.join("a").join("x.txt").exists());
        assert!(root.join("a").join("b").join("y.txt").exists());
        assert!(!root.join("x.txt").exists());
        // two moves and two directory removals
        assert_eq!(report.summary().planned, 4);
        assert_eq!(report.records[0].path, root.join("a").join("b").join("y.txt"));
    }

    #[test]
    fn missing_root_aborts() {
        let temp = tempdir().expect("tempdir");
        let err = flatten(&temp.path().join("missing"), &FlattenOptions::default())
            .expect_err("must fail");
        assert!(matches!(err, TidyError::Traversal { .. }));
    }
}
