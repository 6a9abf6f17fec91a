use std::path::{Path, PathBuf};

/// A file path split into the parts the rename rules operate on.
///
/// The extension starts at the last `.` of the file name and keeps the dot.
/// A name that only starts with a dot (`.bashrc`) has no extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub path: PathBuf,
    pub stem: String,
    pub extension: String,
}

impl FileEntry {
    pub fn from_path(path: &Path) -> Self {
        let file_name = path
            .file_name()
            .map(|v| v.to_string_lossy().to_string())
            .unwrap_or_default();
        let (stem, extension) = split_file_name(&file_name);
        Self {
            path: path.to_path_buf(),
            stem: stem.to_string(),
            extension: extension.to_string(),
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}{}", self.stem, self.extension)
    }
}

pub fn split_file_name(file_name: &str) -> (&str, &str) {
    match file_name.rfind('.') {
        Some(0) | None => (file_name, ""),
        Some(pos) => file_name.split_at(pos),
    }
}
