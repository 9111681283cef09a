//! Run and task reports.
//!
//! Every tolerated collaborator failure becomes an [`OperationFailure`] on the
//! task that hit it, so a best-effort run still has an inspectable outcome.

use serde::{Deserialize, Serialize};

use crate::core::lifecycle::TaskPhase;

/// A collaborator call that failed and was tolerated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationFailure {
    pub phase: TaskPhase,
    /// Operation description, e.g. `push feat/x --force`.
    pub operation: String,
    pub error: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Every transition succeeded.
    Completed,
    /// The lifecycle ran to the end but some operations failed.
    CompletedWithWarnings,
    /// Trunk could not be checked out or the task branch could not be
    /// created; no step was committed.
    Aborted,
}

/// Review handling outcome for a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ReviewOutcome {
    /// Reviews are disabled for this run.
    Skipped,
    Merged { url: Option<String> },
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskReport {
    pub name: String,
    /// Branch the task was replayed on.
    pub branch: String,
    pub status: TaskStatus,
    /// Furthest lifecycle phase that completed.
    pub reached: TaskPhase,
    pub commits_created: usize,
    pub commits_skipped: usize,
    pub review: ReviewOutcome,
    pub failures: Vec<OperationFailure>,
}

impl TaskReport {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            branch: name.clone(),
            name,
            status: TaskStatus::Completed,
            reached: TaskPhase::Trunk,
            commits_created: 0,
            commits_skipped: 0,
            review: ReviewOutcome::Skipped,
            failures: Vec::new(),
        }
    }

    pub fn record_failure(
        &mut self,
        phase: TaskPhase,
        operation: impl Into<String>,
        error: impl ToString,
    ) {
        self.failures.push(OperationFailure {
            phase,
            operation: operation.into(),
            error: error.to_string(),
        });
    }

    /// Mark `phase` as completed if it is further than what was reached.
    pub fn advance(&mut self, phase: TaskPhase) {
        if phase > self.reached {
            self.reached = phase;
        }
    }

    /// Derive the final status from recorded failures.
    pub fn finish(&mut self) {
        if self.status == TaskStatus::Aborted {
            return;
        }
        self.status = if self.failures.is_empty() {
            TaskStatus::Completed
        } else {
            TaskStatus::CompletedWithWarnings
        };
    }
}

/// Report for one `run` over a catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: String,
    pub started_at: String,
    pub finished_at: Option<String>,
    /// True when trunk had no commits and was seeded.
    pub bootstrapped: bool,
    pub bootstrap_failures: Vec<OperationFailure>,
    /// True when a stop was requested before the catalog was exhausted.
    pub cancelled: bool,
    pub tasks: Vec<TaskReport>,
}

/// Aggregate counters for printing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub tasks: usize,
    pub completed: usize,
    pub with_warnings: usize,
    pub aborted: usize,
    pub merged: usize,
    pub commits_created: usize,
    pub commits_skipped: usize,
    pub failures: usize,
}

impl RunReport {
    pub fn new(run_id: impl Into<String>, started_at: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            started_at: started_at.into(),
            finished_at: None,
            bootstrapped: false,
            bootstrap_failures: Vec::new(),
            cancelled: false,
            tasks: Vec::new(),
        }
    }

    pub fn summary(&self) -> RunSummary {
        let mut summary = RunSummary {
            tasks: self.tasks.len(),
            failures: self.bootstrap_failures.len(),
            ..RunSummary::default()
        };
        for task in &self.tasks {
            match task.status {
                TaskStatus::Completed => summary.completed += 1,
                TaskStatus::CompletedWithWarnings => summary.with_warnings += 1,
                TaskStatus::Aborted => summary.aborted += 1,
            }
            if matches!(task.review, ReviewOutcome::Merged { .. }) {
                summary.merged += 1;
            }
            summary.commits_created += task.commits_created;
            summary.commits_skipped += task.commits_skipped;
            summary.failures += task.failures.len();
        }
        summary
    }

    pub fn has_failures(&self) -> bool {
        self.summary().failures > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finish_derives_status_from_failures() {
        let mut clean = TaskReport::new("a");
        clean.finish();
        assert_eq!(clean.status, TaskStatus::Completed);

        let mut noisy = TaskReport::new("b");
        noisy.record_failure(TaskPhase::Pushed, "push b --force", "rejected");
        noisy.finish();
        assert_eq!(noisy.status, TaskStatus::CompletedWithWarnings);

        let mut aborted = TaskReport::new("c");
        aborted.status = TaskStatus::Aborted;
        aborted.record_failure(TaskPhase::BranchCreated, "create branch c", "exists");
        aborted.finish();
        assert_eq!(aborted.status, TaskStatus::Aborted);
    }

    #[test]
    fn task_report_names_its_branch() {
        let report = TaskReport::new("feat/x");
        assert_eq!(report.branch, "feat/x");
        let json = serde_json::to_value(&report).expect("serialize");
        assert_eq!(json["branch"], "feat/x");
        assert_eq!(json["review"]["state"], "skipped");
    }

    #[test]
    fn advance_never_moves_backwards() {
        let mut report = TaskReport::new("a");
        report.advance(TaskPhase::Pushed);
        report.advance(TaskPhase::Committing);
        assert_eq!(report.reached, TaskPhase::Pushed);
    }

    #[test]
    fn summary_counts_statuses_and_commits() {
        let mut run = RunReport::new("run-1", "2026-01-01T00:00:00Z");
        let mut merged = TaskReport::new("a");
        merged.commits_created = 3;
        merged.review = ReviewOutcome::Merged { url: None };
        merged.finish();
        let mut failed = TaskReport::new("b");
        failed.commits_skipped = 1;
        failed.review = ReviewOutcome::Failed {
            error: "already merged".to_string(),
        };
        failed.record_failure(TaskPhase::ReviewOpened, "open review b", "already merged");
        failed.finish();
        run.tasks = vec![merged, failed];

        let summary = run.summary();
        assert_eq!(summary.tasks, 2);
        assert_eq!(summary.completed, 1);
        assert_eq!(summary.with_warnings, 1);
        assert_eq!(summary.merged, 1);
        assert_eq!(summary.commits_created, 3);
        assert_eq!(summary.commits_skipped, 1);
        assert_eq!(summary.failures, 1);
        assert!(run.has_failures());
    }
}
