use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TidyError {
    #[error("リネーム先が既に存在します: {} -> {}", .from.display(), .to.display())]
    DestinationExists { from: PathBuf, to: PathBuf },
    #[error("正規表現を解釈できません: {pattern}: {source}")]
    RuleCompilation {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("フォルダを走査できませんでした: {}: {source}", .path.display())]
    Traversal {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("メタデータを取得できませんでした: {}: {source}", .path.display())]
    Metadata {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("ファイル操作に失敗しました: {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl TidyError {
    pub fn is_destination_exists(&self) -> bool {
        matches!(self, TidyError::DestinationExists { .. })
    }
}
