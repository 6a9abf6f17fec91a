use crate::executor::safe_rename;
use crate::planner::RenamePlan;
use crate::report::{ActionKind, OperationReport, Outcome};
use tracing::{info, warn};

/// Executes a plan one candidate at a time, in plan order.
///
/// Failures are recorded per file and never stop the batch. Renames run
/// sequentially, so two candidates can never race for the same target.
pub fn apply_plan(plan: &RenamePlan, dry_run: bool) -> OperationReport {
    let mut report = OperationReport::new(dry_run);

    for candidate in &plan.candidates {
        let from = candidate.original_path.as_path();
        let to = candidate.target_path.as_path();

        if let Some(reason) = &candidate.error {
            report.record_failure(ActionKind::Rename, from, Some(to), reason);
            continue;
        }
        if !candidate.changed {
            report.record(ActionKind::Rename, from, None, Outcome::Unchanged, None);
            continue;
        }
        if dry_run {
            report.record(ActionKind::Rename, from, Some(to), Outcome::Planned, None);
            continue;
        }

        match safe_rename(from, to) {
            Ok(()) => report.record(ActionKind::Rename, from, Some(to), Outcome::Done, None),
            Err(err) => {
                warn!(error = %err, "rename failed");
                report.record_failure(ActionKind::Rename, from, Some(to), err);
            }
        }
    }

    let summary = report.summary();
    info!(
        root = %plan.root.display(),
        dry_run,
        done = summary.done,
        failed = summary.failed,
        "rename batch finished"
    );
    report
}
