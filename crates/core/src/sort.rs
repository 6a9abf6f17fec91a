use crate::error::TidyError;
use chrono::{DateTime, Local};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    Size,
    Created,
    Modified,
}

/// Requested sort flags. When several are set, size wins over created,
/// created wins over modified.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SortCriteria {
    pub size: bool,
    pub created: bool,
    pub modified: bool,
}

impl SortCriteria {
    pub fn key(&self) -> Option<SortKey> {
        if self.size {
            Some(SortKey::Size)
        } else if self.created {
            Some(SortKey::Created)
        } else if self.modified {
            Some(SortKey::Modified)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FileStat {
    pub path: PathBuf,
    pub size: u64,
    pub created: DateTime<Local>,
    pub modified: DateTime<Local>,
}

/// Creation time falls back to modification time on platforms that do not
/// record it.
pub fn read_stat(path: &Path) -> Result<FileStat, TidyError> {
    let metadata = fs::metadata(path).map_err(|source| TidyError::Metadata {
        path: path.to_path_buf(),
        source,
    })?;
    let modified = metadata.modified().map_err(|source| TidyError::Metadata {
        path: path.to_path_buf(),
        source,
    })?;
    let created = metadata.created().unwrap_or(modified);

    Ok(FileStat {
        path: path.to_path_buf(),
        size: metadata.len(),
        created: DateTime::from(created),
        modified: DateTime::from(modified),
    })
}

/// Reads metadata for every file in parallel and orders the result
/// ascending by `key`. Without a key the input order is kept. Files whose
/// metadata cannot be read are dropped.
pub fn sort_files<P: AsRef<Path> + Sync>(files: &[P], key: Option<SortKey>) -> Vec<FileStat> {
    let mut stats: Vec<FileStat> = files
        .par_iter()
        .map(|path| read_stat(path.as_ref()))
        .collect::<Vec<_>>()
        .into_iter()
        .filter_map(|stat| match stat {
            Ok(stat) => Some(stat),
            Err(err) => {
                warn!(error = %err, "dropping file from sorted output");
                None
            }
        })
        .collect();

    match key {
        Some(SortKey::Size) => stats.sort_by_key(|s| s.size),
        Some(SortKey::Created) => stats.sort_by_key(|s| s.created),
        Some(SortKey::Modified) => stats.sort_by_key(|s| s.modified),
        None => {}
    }

    stats
}

pub fn format_stat_line(stat: &FileStat, date_format: &str) -> String {
    format!(
        "{} (Size: {} bytes, Created: {}, Modified: {})",
        stat.path.display(),
        stat.size,
        stat.created.format(date_format),
        stat.modified.format(date_format)
    )
}

pub fn stats_to_json(stats: &[FileStat]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(stats)
}
