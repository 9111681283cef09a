//! Code-review service adapter.
//!
//! The [`ReviewService`] trait decouples the orchestrator from the hosting
//! service. [`GhReviewService`] drives GitHub pull requests through the `gh`
//! CLI; tests use recording fakes.

use std::path::PathBuf;

use anyhow::Result;
use tracing::{debug, info, instrument};

use crate::core::types::MergeStrategy;
use crate::io::process::{ProcessLimits, run_checked};

/// Parameters for opening a review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewRequest {
    /// Source branch.
    pub branch: String,
    /// Target branch (trunk).
    pub base: String,
    pub title: String,
    pub body: String,
}

/// Identifies an opened review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewHandle {
    pub branch: String,
    /// Review URL when the service reports one.
    pub url: Option<String>,
}

impl ReviewHandle {
    /// Selector the service understands: URL when known, else branch.
    pub fn selector(&self) -> &str {
        self.url.as_deref().unwrap_or(&self.branch)
    }
}

pub trait ReviewService {
    fn open_review(&self, request: &ReviewRequest) -> Result<ReviewHandle>;
    fn merge_review(
        &self,
        handle: &ReviewHandle,
        strategy: MergeStrategy,
        delete_source_branch: bool,
    ) -> Result<()>;
}

/// Review service backed by `gh pr create` / `gh pr merge`.
#[derive(Debug, Clone)]
pub struct GhReviewService {
    workdir: PathBuf,
    limits: ProcessLimits,
}

impl GhReviewService {
    pub fn new(workdir: impl Into<PathBuf>, limits: ProcessLimits) -> Self {
        Self {
            workdir: workdir.into(),
            limits,
        }
    }
}

impl ReviewService for GhReviewService {
    #[instrument(skip_all, fields(branch = %request.branch, base = %request.base))]
    fn open_review(&self, request: &ReviewRequest) -> Result<ReviewHandle> {
        let output = run_checked(
            "gh",
            &[
                "pr",
                "create",
                "--title",
                &request.title,
                "--body",
                &request.body,
                "--base",
                &request.base,
                "--head",
                &request.branch,
            ],
            &self.workdir,
            &self.limits,
        )?;
        let url = parse_review_url(&output.stdout_text());
        info!(url = ?url, "review opened");
        Ok(ReviewHandle {
            branch: request.branch.clone(),
            url,
        })
    }

    #[instrument(skip_all, fields(review = handle.selector(), strategy = strategy.as_str()))]
    fn merge_review(
        &self,
        handle: &ReviewHandle,
        strategy: MergeStrategy,
        delete_source_branch: bool,
    ) -> Result<()> {
        let strategy_flag = format!("--{}", strategy.as_str());
        let mut args = vec!["pr", "merge", handle.selector(), strategy_flag.as_str()];
        if delete_source_branch {
            args.push("--delete-branch");
        }
        run_checked("gh", &args, &self.workdir, &self.limits)?;
        debug!("review merged");
        Ok(())
    }
}

/// Last line of `gh pr create` output that looks like a URL.
fn parse_review_url(stdout: &str) -> Option<String> {
    stdout
        .lines()
        .map(str::trim)
        .rev()
        .find(|line| line.starts_with("https://") || line.starts_with("http://"))
        .map(str::to_string)
}
