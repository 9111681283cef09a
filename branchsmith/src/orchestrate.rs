//! Lifecycle orchestrator: drives every task from trunk through branch,
//! commits, push, review, and merge, then back to trunk.
//!
//! The orchestrator is the error boundary for each task. Collaborator
//! failures are logged, recorded on the task's report, and the run moves on.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;
use chrono::{SecondsFormat, Utc};
use tracing::{debug, info, instrument, warn};

use crate::core::lifecycle::TaskPhase;
use crate::core::report::{OperationFailure, ReviewOutcome, RunReport, TaskReport, TaskStatus};
use crate::core::review_body::ReviewBodyRenderer;
use crate::core::types::{EmptyCommitPolicy, MergeStrategy, Task};
use crate::io::config::{BootstrapConfig, BranchsmithConfig};
use crate::io::git::{CommitOutcome, VersionControl};
use crate::io::review::{ReviewRequest, ReviewService};
use crate::io::worktree::WorkingTree;
use crate::mutate::apply_step;

/// Run-wide lifecycle settings.
pub struct RunOptions {
    pub trunk: String,
    pub push: bool,
    pub open_reviews: bool,
    pub merge_strategy: MergeStrategy,
    pub delete_source_branch: bool,
    pub pull_after_merge: bool,
    pub empty_commits: EmptyCommitPolicy,
    pub bootstrap: BootstrapConfig,
    pub review_body: ReviewBodyRenderer,
}

impl RunOptions {
    pub fn from_config(cfg: &BranchsmithConfig) -> Result<Self> {
        Ok(Self {
            trunk: cfg.trunk.clone(),
            push: cfg.push,
            open_reviews: cfg.open_reviews,
            merge_strategy: cfg.merge_strategy,
            delete_source_branch: cfg.delete_source_branch,
            pull_after_merge: cfg.pull_after_merge,
            empty_commits: cfg.empty_commits,
            bootstrap: cfg.bootstrap.clone(),
            review_body: ReviewBodyRenderer::new(cfg.review_body_template.as_deref())?,
        })
    }
}

/// Cooperative cancellation, checked between tasks only.
///
/// A stop is requested either in-process or by creating the stop file.
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    flag: Arc<AtomicBool>,
    stop_file: Option<PathBuf>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stop_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.stop_file = Some(path.into());
        self
    }

    pub fn request_stop(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_stop_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst) || self.stop_file.as_deref().is_some_and(Path::exists)
    }
}

/// Current UTC time as an RFC 3339 string.
pub fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Sortable run identifier, e.g. `run-20260102_030405`.
pub fn new_run_id() -> String {
    format!("run-{}", Utc::now().format("%Y%m%d_%H%M%S"))
}

pub struct Orchestrator<'a, V: VersionControl, R: ReviewService, W: WorkingTree> {
    vcs: &'a V,
    review: &'a R,
    tree: &'a W,
    options: RunOptions,
    stop: StopSignal,
}

impl<'a, V: VersionControl, R: ReviewService, W: WorkingTree> Orchestrator<'a, V, R, W> {
    pub fn new(vcs: &'a V, review: &'a R, tree: &'a W, options: RunOptions) -> Self {
        Self {
            vcs,
            review,
            tree,
            options,
            stop: StopSignal::new(),
        }
    }

    pub fn with_stop(mut self, stop: StopSignal) -> Self {
        self.stop = stop;
        self
    }

    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    /// Process `tasks` in order. Never fails; see the returned report.
    pub fn run(&self, tasks: &[Task], run_id: &str) -> RunReport {
        let mut report = RunReport::new(run_id, timestamp_now());
        info!(run_id, tasks = tasks.len(), trunk = %self.options.trunk, "run started");

        report.bootstrapped = self.bootstrap(&mut report.bootstrap_failures);

        for (index, task) in tasks.iter().enumerate() {
            if self.stop.is_stop_requested() {
                warn!(
                    remaining = tasks.len() - index,
                    "stop requested, skipping remaining tasks"
                );
                report.cancelled = true;
                break;
            }
            let task_report = self.run_task(task);
            report.tasks.push(task_report);
        }

        report.finished_at = Some(timestamp_now());
        let summary = report.summary();
        info!(
            tasks = summary.tasks,
            completed = summary.completed,
            with_warnings = summary.with_warnings,
            aborted = summary.aborted,
            merged = summary.merged,
            commits = summary.commits_created,
            failures = summary.failures,
            cancelled = report.cancelled,
            "run finished"
        );
        report
    }

    /// Seed trunk with one commit when it has no history.
    ///
    /// Returns true when a seed commit was made.
    fn bootstrap(&self, failures: &mut Vec<OperationFailure>) -> bool {
        let phase = TaskPhase::Trunk;
        self.ensure_trunk(failures);
        let commits = match self.vcs.count_commits() {
            Ok(count) => count,
            Err(err) => {
                debug!(error = %format!("{err:#}"), "commit count unavailable, treating trunk as empty");
                0
            }
        };
        if commits > 0 {
            debug!(commits, "trunk has history, no bootstrap needed");
            return false;
        }

        let seed = &self.options.bootstrap;
        info!(file = %seed.file, "trunk has no commits, seeding");
        let seeded = tolerate(
            failures,
            phase,
            format!("write {}", seed.file),
            self.tree.write(Path::new(&seed.file), &seed.content),
        );
        if seeded.is_none() {
            return false;
        }
        tolerate(
            failures,
            phase,
            format!("add {}", seed.file),
            self.vcs.add(&[seed.file.as_str()]),
        );
        let committed = tolerate(
            failures,
            phase,
            format!("commit '{}'", seed.message),
            self.vcs.commit(&seed.message, false),
        );
        if committed != Some(CommitOutcome::Committed) {
            return false;
        }
        if self.options.push {
            tolerate(
                failures,
                phase,
                format!("push {}", self.options.trunk),
                self.vcs.push(&self.options.trunk, false),
            );
        }
        true
    }

    /// Check out trunk, creating it when the checkout fails (unborn trunk).
    fn ensure_trunk(&self, failures: &mut Vec<OperationFailure>) -> bool {
        let trunk = self.options.trunk.as_str();
        let Err(checkout_err) = self.vcs.checkout(trunk) else {
            return true;
        };
        debug!(trunk, error = %format!("{checkout_err:#}"), "trunk checkout failed, creating it");
        tolerate(
            failures,
            TaskPhase::Trunk,
            format!("checkout {trunk}"),
            self.vcs.create_branch(trunk),
        )
        .is_some()
    }

    /// Run one task through the full lifecycle.
    #[instrument(skip_all, fields(task = %task.name))]
    pub fn run_task(&self, task: &Task) -> TaskReport {
        let mut report = TaskReport::new(&task.name);
        let branch = task.name.as_str();
        let trunk = self.options.trunk.as_str();
        info!(steps = task.steps.len(), "task started");

        // TRUNK -> BRANCH_RESET
        if !self.ensure_trunk(&mut report.failures) {
            warn!("trunk not checked out, aborting task without branching");
            report.status = TaskStatus::Aborted;
            report.finish();
            return report;
        }
        self.reset_branch(branch, &mut report);
        report.advance(TaskPhase::BranchReset);

        // BRANCH_RESET -> BRANCH_CREATED
        if let Err(err) = self.vcs.create_branch(branch) {
            tolerate::<()>(
                &mut report.failures,
                TaskPhase::BranchReset,
                format!("create_branch {branch}"),
                Err(err),
            );
            warn!("branch not created, aborting task without committing");
            report.status = TaskStatus::Aborted;
            report.finish();
            return report;
        }
        report.advance(TaskPhase::BranchCreated);

        // COMMITTING
        let uncommitted = self.commit_steps(task, &mut report);
        report.advance(TaskPhase::Committing);
        if !uncommitted.is_empty() {
            self.discard(&uncommitted, &mut report);
        }

        // PUSHED
        if self.options.push {
            let pushed = tolerate(
                &mut report.failures,
                TaskPhase::Committing,
                format!("push {branch} --force"),
                self.vcs.push(branch, true),
            );
            if pushed.is_some() {
                report.advance(TaskPhase::Pushed);
            }
        }

        // REVIEW_OPENED -> MERGED
        if self.options.open_reviews {
            self.review_and_merge(task, &mut report);
        }

        // MERGED -> TRUNK
        tolerate(
            &mut report.failures,
            TaskPhase::Trunk,
            format!("checkout {trunk}"),
            self.vcs.checkout(trunk),
        );
        let merged = matches!(report.review, ReviewOutcome::Merged { .. });
        if merged && self.options.pull_after_merge {
            tolerate(
                &mut report.failures,
                TaskPhase::Trunk,
                format!("pull {trunk}"),
                self.vcs.pull(trunk),
            );
        }
        if merged && self.options.delete_source_branch {
            self.delete_if_listed(branch, &mut report);
        }

        report.finish();
        info!(
            status = ?report.status,
            reached = %report.reached,
            commits = report.commits_created,
            skipped = report.commits_skipped,
            failures = report.failures.len(),
            "task finished"
        );
        report
    }

    /// Force-delete a stale local branch named `branch`.
    ///
    /// "Does not exist" is not a failure. When the branch list is
    /// unavailable the delete is attempted blind and its failure ignored.
    fn reset_branch(&self, branch: &str, report: &mut TaskReport) {
        match self.vcs.list_branches() {
            Ok(branches) => {
                if branches.iter().any(|name| name == branch) {
                    info!(branch, "deleting stale local branch");
                    tolerate(
                        &mut report.failures,
                        TaskPhase::BranchReset,
                        format!("delete_branch {branch}"),
                        self.vcs.delete_branch(branch),
                    );
                }
            }
            Err(err) => {
                debug!(error = %format!("{err:#}"), "branch list unavailable, deleting blind");
                if let Err(err) = self.vcs.delete_branch(branch) {
                    debug!(error = %format!("{err:#}"), "blind delete failed");
                }
            }
        }
    }

    /// Apply and commit every step in order.
    ///
    /// Returns the paths touched since the last successful commit. They are
    /// non-empty only when a later stage or commit failed, and must be
    /// discarded before leaving the branch.
    fn commit_steps(&self, task: &Task, report: &mut TaskReport) -> Vec<PathBuf> {
        let allow_empty = self.options.empty_commits.allows_empty();
        let mut uncommitted: Vec<PathBuf> = Vec::new();
        for (index, step) in task.steps.iter().enumerate() {
            let number = index + 1;
            debug!(step = number, message = %step.message, "applying step");
            let applied = apply_step(step, self.tree);
            uncommitted.extend(applied.created_dirs);
            uncommitted.extend(applied.written);
            for failure in applied.failures {
                report.record_failure(
                    TaskPhase::Committing,
                    format!("{} {} (step {number})", failure.operation, failure.path.display()),
                    failure.error,
                );
            }

            let staged = tolerate(
                &mut report.failures,
                TaskPhase::Committing,
                format!("add (step {number})"),
                self.vcs.add(&["."]),
            );
            if staged.is_none() {
                continue;
            }
            match self.vcs.commit(&step.message, allow_empty) {
                Ok(CommitOutcome::Committed) => {
                    report.commits_created += 1;
                    uncommitted.clear();
                }
                Ok(CommitOutcome::NothingToCommit) => {
                    debug!(step = number, "nothing to commit, step skipped");
                    report.commits_skipped += 1;
                    uncommitted.clear();
                }
                Err(err) => {
                    tolerate::<()>(
                        &mut report.failures,
                        TaskPhase::Committing,
                        format!("commit '{}' (step {number})", step.message),
                        Err(err),
                    );
                }
            }
        }
        uncommitted
    }

    /// Reset the task branch to its last commit so nothing it failed to
    /// commit follows the checkout back to trunk.
    fn discard(&self, paths: &[PathBuf], report: &mut TaskReport) {
        let mut unique: Vec<String> = paths
            .iter()
            .map(|path| path.to_string_lossy().into_owned())
            .collect();
        unique.sort();
        unique.dedup();
        warn!(paths = unique.len(), "discarding uncommitted task changes");
        let args: Vec<&str> = unique.iter().map(String::as_str).collect();
        tolerate(
            &mut report.failures,
            TaskPhase::Committing,
            format!("discard_changes {}", args.join(" ")),
            self.vcs.discard_changes(&args),
        );
    }

    /// Open a review and merge it immediately. Both calls share one failure
    /// boundary: the first failure ends review handling for the task.
    fn review_and_merge(&self, task: &Task, report: &mut TaskReport) {
        let phase = report.reached;
        let body = match self.options.review_body.render(task, &self.options.trunk) {
            Ok(body) => body,
            Err(err) => {
                warn!(error = %format!("{err:#}"), "review body template failed, using task body");
                task.body.clone()
            }
        };
        let request = ReviewRequest {
            branch: task.name.clone(),
            base: self.options.trunk.clone(),
            title: task.title.clone(),
            body,
        };

        let handle = match self.review.open_review(&request) {
            Ok(handle) => handle,
            Err(err) => {
                report.review = ReviewOutcome::Failed {
                    error: format!("{err:#}"),
                };
                tolerate::<()>(
                    &mut report.failures,
                    phase,
                    format!("open_review {}", task.name),
                    Err(err),
                );
                return;
            }
        };
        report.advance(TaskPhase::ReviewOpened);

        match self.review.merge_review(
            &handle,
            self.options.merge_strategy,
            self.options.delete_source_branch,
        ) {
            Ok(()) => {
                info!(review = handle.selector(), "review merged");
                report.advance(TaskPhase::Merged);
                report.review = ReviewOutcome::Merged { url: handle.url };
            }
            Err(err) => {
                report.review = ReviewOutcome::Failed {
                    error: format!("{err:#}"),
                };
                tolerate::<()>(
                    &mut report.failures,
                    TaskPhase::ReviewOpened,
                    format!(
                        "merge_review {} --{}",
                        handle.selector(),
                        self.options.merge_strategy.as_str()
                    ),
                    Err(err),
                );
            }
        }
    }

    fn delete_if_listed(&self, branch: &str, report: &mut TaskReport) {
        let listed = match self.vcs.list_branches() {
            Ok(branches) => branches.iter().any(|name| name == branch),
            Err(err) => {
                debug!(error = %format!("{err:#}"), "branch list unavailable after merge");
                false
            }
        };
        if listed {
            tolerate(
                &mut report.failures,
                TaskPhase::Trunk,
                format!("delete_branch {branch}"),
                self.vcs.delete_branch(branch),
            );
        }
    }
}

/// Downgrade a collaborator failure to a logged, recorded warning.
fn tolerate<T>(
    failures: &mut Vec<OperationFailure>,
    phase: TaskPhase,
    operation: String,
    result: Result<T>,
) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            let error = format!("{err:#}");
            warn!(%phase, operation = %operation, error = %error, "operation failed, continuing");
            failures.push(OperationFailure {
                phase,
                operation,
                error,
            });
            None
        }
    }
}
