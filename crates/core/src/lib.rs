mod apply;
mod cleanup;
mod config;
mod entry;
mod error;
mod executor;
mod flatten;
mod planner;
mod report;
mod rules;
mod sort;
mod template;
mod traverse;

pub use apply::apply_plan;
pub use cleanup::{remove_empty_dirs, remove_empty_files, CleanupOptions};
pub use config::{
    app_paths, load_config, load_config_from, save_config, save_config_to, AppConfig, AppPaths,
    DEFAULT_DATE_FORMAT,
};
pub use entry::{split_file_name, FileEntry};
pub use error::TidyError;
pub use executor::{remove_file, safe_remove_dir, safe_rename, RemoveDirOutcome};
pub use flatten::{flatten, FlattenOptions};
pub use planner::{
    plan_batch_rename, plan_option_rename, validate_file_name, BatchRenameRequest, PlanRule,
    RenameCandidate, RenamePlan, RenameRequest, RenameStats,
};
pub use report::{ActionKind, ActionRecord, OperationReport, Outcome, ReportSummary};
pub use rules::{compute_new_name, RenameOptions, RenameRules};
pub use sort::{
    format_stat_line, read_stat, sort_files, stats_to_json, FileStat, SortCriteria, SortKey,
};
pub use template::{
    expand_batch_rule, parse_template, render_template, BatchRule, RuleContext, TemplatePart, Token,
};
pub use traverse::{traverse, TraverseResult};
