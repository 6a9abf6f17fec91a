use crate::rules::{RenameOptions, RenameRules};
use crate::sort::{sort_files, SortKey};
use crate::template::BatchRule;
use crate::traverse::traverse;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf, MAIN_SEPARATOR};
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct RenameRequest {
    pub root: PathBuf,
    pub recursive: bool,
    pub options: RenameOptions,
}

#[derive(Debug, Clone, Default)]
pub struct BatchRenameRequest {
    pub root: PathBuf,
    pub recursive: bool,
    pub rule: String,
    /// Order that `{0}` / `{1}` follow. `None` keeps traversal order.
    pub sort: Option<SortKey>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlanRule {
    Options(RenameOptions),
    Template { template: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenameCandidate {
    pub original_path: PathBuf,
    pub target_path: PathBuf,
    pub changed: bool,
    /// Set when the computed target cannot be applied; such candidates are
    /// reported as failures and never touch the filesystem.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RenameStats {
    pub scanned_files: usize,
    pub planned: usize,
    pub unchanged: usize,
    pub invalid: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenamePlan {
    pub root: PathBuf,
    pub rule: PlanRule,
    pub candidates: Vec<RenameCandidate>,
    pub stats: RenameStats,
}

pub fn plan_option_rename(request: &RenameRequest) -> Result<RenamePlan> {
    let rules = RenameRules::compile(&request.options)?;
    let scanned = traverse(&request.root, request.recursive)?;

    let names: Vec<String> = scanned.files.iter().map(|f| rules.apply(f)).collect();
    Ok(build_plan(
        &request.root,
        PlanRule::Options(request.options.clone()),
        &scanned.files,
        names,
    ))
}

pub fn plan_batch_rename(request: &BatchRenameRequest) -> Result<RenamePlan> {
    let rule = BatchRule::parse(&request.rule)
        .with_context(|| format!("リネームルールを解釈できませんでした: {}", request.rule))?;
    let scanned = traverse(&request.root, request.recursive)?;

    // Files whose metadata vanished are dropped here, before indices are
    // assigned.
    let ordered: Vec<PathBuf> = sort_files(&scanned.files, request.sort)
        .into_iter()
        .map(|stat| stat.path)
        .collect();
    let names = rule.expand(&ordered);

    Ok(build_plan(
        &request.root,
        PlanRule::Template {
            template: rule.to_string(),
        },
        &ordered,
        names,
    ))
}

fn build_plan(root: &Path, rule: PlanRule, files: &[PathBuf], names: Vec<String>) -> RenamePlan {
    let mut stats = RenameStats {
        scanned_files: files.len(),
        ..Default::default()
    };
    let mut candidates = Vec::with_capacity(files.len());
    let mut planned_paths = HashSet::<PathBuf>::new();

    for (original, name) in files.iter().zip(names) {
        let parent = original.parent().unwrap_or_else(|| Path::new(""));
        let target = parent.join(&name);

        // A file that keeps its name still claims its path, so a later
        // candidate aimed at it is refused.
        let error = match validate_file_name(&name) {
            Err(reason) => Some(reason),
            Ok(()) if target == *original => {
                planned_paths.insert(target.clone());
                None
            }
            Ok(()) if !planned_paths.insert(target.clone()) => {
                Some(format!("重複したリネーム先が含まれています: {}", target.display()))
            }
            Ok(()) => None,
        };

        let changed = error.is_none() && target != *original;
        if error.is_some() {
            stats.invalid += 1;
        } else if changed {
            stats.planned += 1;
        } else {
            stats.unchanged += 1;
        }

        debug!(from = %original.display(), to = %target.display(), changed, "planned");
        candidates.push(RenameCandidate {
            original_path: original.clone(),
            target_path: target,
            changed,
            error,
        });
    }

    RenamePlan {
        root: root.to_path_buf(),
        rule,
        candidates,
        stats,
    }
}

/// A rendered name must stay a single path component.
pub fn validate_file_name(name: &str) -> std::result::Result<(), String> {
    if name.is_empty() || name == "." || name == ".." {
        return Err(format!("ファイル名が不正です: {name:?}"));
    }
    if name.contains('/') || name.contains(MAIN_SEPARATOR) || name.contains('\0') {
        return Err(format!("ファイル名に区切り文字は使えません: {name}"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TidyError;
    use std::fs;
    use tempfile::tempdir;

    fn targets(plan: &RenamePlan) -> Vec<String> {
        plan.candidates
            .iter()
            .map(|c| {
                c.target_path
                    .file_name()
                    .expect("file name")
                    .to_string_lossy()
                    .to_string()
            })
            .collect()
    }

    #[test]
    fn option_plan_keeps_parent_directory() {
        let temp = tempdir().expect("tempdir");
        let nested = temp.path().join("sub");
        fs::create_dir_all(&nested).expect("create sub");
        fs::write(temp.path().join("a.txt"), b"a").expect("write a");
        fs::write(nested.join("b.txt"), b"b").expect("write b");

        let plan = plan_option_rename(&RenameRequest {
            root: temp.path().to_path_buf(),
            recursive: true,
            options: RenameOptions {
                prefix: Some("p_".to_string()),
                ..Default::default()
            },
        })
        .expect("plan");

        assert_eq!(plan.candidates.len(), 2);
        assert_eq!(plan.candidates[0].target_path, temp.path().join("p_a.txt"));
        assert_eq!(plan.candidates[1].target_path, nested.join("p_b.txt"));
        assert!(plan.candidates.iter().all(|c| c.changed));
    }

    #[test]
    fn option_plan_marks_unchanged_names() {
        let temp = tempdir().expect("tempdir");
        fs::write(temp.path().join("keep.txt"), b"k").expect("write keep");

        let plan = plan_option_rename(&RenameRequest {
            root: temp.path().to_path_buf(),
            ..Default::default()
        })
        .expect("plan");
        assert!(!plan.candidates[0].changed);
        assert_eq!(plan.stats.unchanged, 1);
    }

    #[test]
    fn option_plan_rejects_invalid_regex_before_touching_disk() {
        let temp = tempdir().expect("tempdir");
        let err = plan_option_rename(&RenameRequest {
            root: temp.path().join("missing"),
            recursive: false,
            options: RenameOptions {
                regex: vec![("(".to_string(), "x".to_string())],
                ..Default::default()
            },
        })
        .expect_err("must fail");
        assert!(matches!(
            err.downcast_ref::<TidyError>(),
            Some(TidyError::RuleCompilation { .. })
        ));
    }

    #[test]
    fn batch_plan_indexes_in_size_order() {
        let temp = tempdir().expect("tempdir");
        fs::write(temp.path().join("a.txt"), vec![0u8; 20]).expect("write a");
        fs::write(temp.path().join("b.txt"), vec![0u8; 5]).expect("write b");
        fs::write(temp.path().join("c.txt"), vec![0u8; 10]).expect("write c");

        let plan = plan_batch_rename(&BatchRenameRequest {
            root: temp.path().to_path_buf(),
            recursive: false,
            rule: "{1}_{F}".to_string(),
            sort: Some(SortKey::Size),
        })
        .expect("plan");
        assert_eq!(targets(&plan), ["1_b.txt", "2_c.txt", "3_a.txt"]);
    }

    #[test]
    fn batch_plan_uses_traversal_order_without_sort() {
        let temp = tempdir().expect("tempdir");
        fs::write(temp.path().join("b.txt"), b"b").expect("write b");
        fs::write(temp.path().join("a.txt"), b"a").expect("write a");

        let plan = plan_batch_rename(&BatchRenameRequest {
            root: temp.path().to_path_buf(),
            rule: "{0}".to_string(),
            ..Default::default()
        })
        .expect("plan");
        assert_eq!(targets(&plan), ["0.txt", "1.txt"]);
        assert_eq!(plan.candidates[0].original_path, temp.path().join("a.txt"));
    }

    #[test]
    fn batch_plan_flags_duplicate_and_invalid_targets() {
        let temp = tempdir().expect("tempdir");
        fs::write(temp.path().join("a.txt"), b"a").expect("write a");
        fs::write(temp.path().join("b.txt"), b"b").expect("write b");
        fs::write(temp.path().join("c"), b"c").expect("write c");

        let plan = plan_batch_rename(&BatchRenameRequest {
            root: temp.path().to_path_buf(),
            rule: "same".to_string(),
            ..Default::default()
        })
        .expect("plan");

        assert!(plan.candidates[0].error.is_none());
        assert!(plan.candidates[1]
            .error
            .as_deref()
            .expect("duplicate flagged")
            .contains("重複"));
        assert!(plan.candidates[2].error.is_none(), "c -> same has no extension");
        assert_eq!(plan.stats.invalid, 1);

        let plan = plan_batch_rename(&BatchRenameRequest {
            root: temp.path().to_path_buf(),
            rule: "x/{F}".to_string(),
            ..Default::default()
        })
        .expect("plan");
        assert!(plan.candidates.iter().all(|c| c.error.is_some() && !c.changed));
    }

    #[test]
    fn file_keeping_its_name_is_not_a_duplicate() {
        let temp = tempdir().expect("tempdir");
        fs::write(temp.path().join("a.txt"), b"a").expect("write a");
        fs::write(temp.path().join("b.txt"), b"b").expect("write b");

        let plan = plan_option_rename(&RenameRequest {
            root: temp.path().to_path_buf(),
            recursive: false,
            options: RenameOptions {
                replace: vec![("a".to_string(), "b".to_string())],
                ..Default::default()
            },
        })
        .expect("plan");

        assert_eq!(targets(&plan), ["b.txt", "b.txt"]);
        assert!(plan.candidates[0].changed);
        assert!(plan.candidates[0].error.is_none());
        assert!(!plan.candidates[1].changed);
        assert!(plan.candidates[1].error.is_none());
        assert_eq!(plan.stats.planned, 1);
        assert_eq!(plan.stats.unchanged, 1);
        assert_eq!(plan.stats.invalid, 0);
    }

    #[test]
    fn kept_name_still_blocks_later_candidates() {
        let temp = tempdir().expect("tempdir");
        fs::write(temp.path().join("a.txt"), b"a").expect("write a");
        fs::write(temp.path().join("b.txt"), b"b").expect("write b");

        let plan = plan_option_rename(&RenameRequest {
            root: temp.path().to_path_buf(),
            recursive: false,
            options: RenameOptions {
                replace: vec![("b".to_string(), "a".to_string())],
                ..Default::default()
            },
        })
        .expect("plan");

        assert!(!plan.candidates[0].changed);
        assert!(plan.candidates[0].error.is_none());
        assert!(plan.candidates[1]
            .error
            .as_deref()
            .expect("duplicate flagged")
            .contains("重複"));
        assert_eq!(plan.stats.invalid, 1);
    }

    #[test]
    fn stats_count_only_applicable_renames_as_planned() {
        let temp = tempdir().expect("tempdir");
        fs::write(temp.path().join("keep.md"), b"k").expect("write keep");
        fs::write(temp.path().join("old1.txt"), b"1").expect("write old1");
        fs::write(temp.path().join("old2.txt"), b"2").expect("write old2");

        let plan = plan_option_rename(&RenameRequest {
            root: temp.path().to_path_buf(),
            recursive: false,
            options: RenameOptions {
                replace: vec![("old".to_string(), "new".to_string())],
                ..Default::default()
            },
        })
        .expect("plan");

        assert_eq!(plan.stats.scanned_files, 3);
        assert_eq!(plan.stats.planned, 2);
        assert_eq!(plan.stats.unchanged, 1);
        assert_eq!(plan.stats.invalid, 0);
    }

    #[test]
    fn validate_file_name_rejects_components() {
        assert!(validate_file_name("ok.txt").is_ok());
        assert!(validate_file_name(".txt").is_ok());
        assert!(validate_file_name("").is_err());
        assert!(validate_file_name("..").is_err());
        assert!(validate_file_name("a/b").is_err());
    }
}
