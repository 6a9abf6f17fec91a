use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Rename,
    Move,
    RemoveFile,
    RemoveDir,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Done,
    Planned,
    Unchanged,
    Skipped,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionRecord {
    pub action: ActionKind,
    pub path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<PathBuf>,
    pub outcome: Outcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub done: usize,
    pub planned: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Outcome of every filesystem action one command attempted, in the order
/// the actions ran.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OperationReport {
    pub dry_run: bool,
    pub records: Vec<ActionRecord>,
}

impl OperationReport {
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            records: Vec::new(),
        }
    }

    pub fn record(
        &mut self,
        action: ActionKind,
        path: &Path,
        target: Option<&Path>,
        outcome: Outcome,
        message: Option<String>,
    ) {
        self.records.push(ActionRecord {
            action,
            path: path.to_path_buf(),
            target: target.map(Path::to_path_buf),
            outcome,
            message,
        });
    }

    pub fn record_failure(
        &mut self,
        action: ActionKind,
        path: &Path,
        target: Option<&Path>,
        message: impl fmt::Display,
    ) {
        self.record(action, path, target, Outcome::Failed, Some(message.to_string()));
    }

    pub fn summary(&self) -> ReportSummary {
        let mut summary = ReportSummary::default();
        for record in &self.records {
            match record.outcome {
                Outcome::Done => summary.done += 1,
                Outcome::Planned => summary.planned += 1,
                Outcome::Unchanged => summary.unchanged += 1,
                Outcome::Skipped => summary.skipped += 1,
                Outcome::Failed => summary.failed += 1,
            }
        }
        summary
    }

    pub fn has_failures(&self) -> bool {
        self.records.iter().any(|r| r.outcome == Outcome::Failed)
    }

    pub fn with_outcome(&self, outcome: Outcome) -> impl Iterator<Item = &ActionRecord> {
        self.records.iter().filter(move |r| r.outcome == outcome)
    }
}

impl ActionKind {
    fn label(self) -> &'static str {
        match self {
            ActionKind::Rename => "リネーム",
            ActionKind::Move => "移動",
            ActionKind::RemoveFile => "ファイル削除",
            ActionKind::RemoveDir => "フォルダ削除",
        }
    }
}

impl Outcome {
    fn label(self) -> &'static str {
        match self {
            Outcome::Done => "完了",
            Outcome::Planned => "dry-run",
            Outcome::Unchanged => "変更なし",
            Outcome::Skipped => "スキップ",
            Outcome::Failed => "失敗",
        }
    }
}

impl fmt::Display for ActionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.outcome.label(),
            self.action.label(),
            self.path.display()
        )?;
        if let Some(target) = &self.target {
            write!(f, " -> {}", target.display())?;
        }
        if let Some(message) = &self.message {
            write!(f, " ({message})")?;
        }
        Ok(())
    }
}

impl fmt::Display for ReportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "集計: done={} planned={} unchanged={} skipped={} failed={}",
            self.done, self.planned, self.unchanged, self.skipped, self.failed
        )
    }
}
