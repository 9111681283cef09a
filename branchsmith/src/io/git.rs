//! Version-control backend.
//!
//! The orchestrator drives branches through [`VersionControl`]; [`Git`] is the
//! production adapter around `git` subprocess calls. Every call is bounded by
//! [`ProcessLimits`] so a hung remote surfaces as an ordinary failure.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use tracing::{debug, instrument, warn};

use crate::io::process::{CommandOutput, ProcessLimits, run_checked};

/// Result of a commit attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed,
    /// Nothing was staged and empty commits were not allowed.
    NothingToCommit,
}

/// Operations the orchestrator needs from a version-control backend.
///
/// Every call may fail; callers decide whether a failure is tolerated.
pub trait VersionControl {
    fn checkout(&self, branch: &str) -> Result<()>;
    /// Create `name` at the current HEAD and check it out.
    fn create_branch(&self, name: &str) -> Result<()>;
    /// Force-delete a local branch.
    fn delete_branch(&self, name: &str) -> Result<()>;
    /// Stage all changes (additions, modifications, deletions) under `paths`.
    fn add(&self, paths: &[&str]) -> Result<()>;
    fn commit(&self, message: &str, allow_empty: bool) -> Result<CommitOutcome>;
    fn push(&self, branch: &str, force: bool) -> Result<()>;
    fn pull(&self, branch: &str) -> Result<()>;
    fn merge(&self, branch: &str) -> Result<()>;
    /// Number of commits reachable from HEAD.
    fn count_commits(&self) -> Result<u64>;
    fn list_branches(&self) -> Result<Vec<String>>;
    fn delete_remote_branch(&self, name: &str) -> Result<()>;
    /// Drop uncommitted changes: reset tracked files to HEAD and remove the
    /// untracked `paths`. Other untracked files are left alone.
    fn discard_changes(&self, paths: &[&str]) -> Result<()>;
}

/// Wrapper for executing git commands in a working directory.
#[derive(Debug, Clone)]
pub struct Git {
    workdir: PathBuf,
    remote: String,
    limits: ProcessLimits,
}

impl Git {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
            remote: "origin".to_string(),
            limits: ProcessLimits::default(),
        }
    }

    pub fn with_remote(mut self, remote: impl Into<String>) -> Self {
        self.remote = remote.into();
        self
    }

    pub fn with_limits(mut self, limits: ProcessLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Return the current branch name (errors on detached HEAD).
    #[instrument(skip_all)]
    pub fn current_branch(&self) -> Result<String> {
        let out = self.run_capture(&["rev-parse", "--abbrev-ref", "HEAD"])?;
        let name = out.trim().to_string();
        if name == "HEAD" {
            warn!("detached HEAD detected");
            return Err(anyhow!("detached HEAD"));
        }
        debug!(branch = %name, "current branch");
        Ok(name)
    }

    /// True if `workdir` is inside a git work tree.
    pub fn is_repository(&self) -> bool {
        self.run_capture(&["rev-parse", "--is-inside-work-tree"])
            .map(|out| out.trim() == "true")
            .unwrap_or(false)
    }

    /// True if there is anything staged for commit.
    pub fn has_staged_changes(&self) -> Result<bool> {
        let out = self.run_capture(&["diff", "--cached", "--name-only"])?;
        Ok(!out.trim().is_empty())
    }

    fn run_capture(&self, args: &[&str]) -> Result<String> {
        let output = self.run_checked(args)?;
        Ok(output.stdout_text())
    }

    fn run_checked(&self, args: &[&str]) -> Result<CommandOutput> {
        run_checked("git", args, &self.workdir, &self.limits)
    }
}

impl VersionControl for Git {
    #[instrument(skip_all, fields(branch))]
    fn checkout(&self, branch: &str) -> Result<()> {
        debug!(branch, "checking out branch");
        self.run_checked(&["checkout", branch])?;
        Ok(())
    }

    #[instrument(skip_all, fields(branch = name))]
    fn create_branch(&self, name: &str) -> Result<()> {
        debug!(branch = name, "creating and checking out new branch");
        self.run_checked(&["checkout", "-b", name])?;
        Ok(())
    }

    #[instrument(skip_all, fields(branch = name))]
    fn delete_branch(&self, name: &str) -> Result<()> {
        self.run_checked(&["branch", "-D", name])?;
        Ok(())
    }

    fn add(&self, paths: &[&str]) -> Result<()> {
        let mut args = vec!["add", "-A", "--"];
        args.extend_from_slice(paths);
        self.run_checked(&args)?;
        Ok(())
    }

    /// Commit staged changes with a message.
    ///
    /// Without `allow_empty`, an empty index returns `NothingToCommit` and runs nothing.
    #[instrument(skip_all)]
    fn commit(&self, message: &str, allow_empty: bool) -> Result<CommitOutcome> {
        if allow_empty {
            self.run_checked(&["commit", "--allow-empty", "-m", message])?;
            return Ok(CommitOutcome::Committed);
        }
        if !self.has_staged_changes()? {
            debug!("no staged changes, skipping commit");
            return Ok(CommitOutcome::NothingToCommit);
        }
        debug!("committing staged changes");
        self.run_checked(&["commit", "-m", message])?;
        Ok(CommitOutcome::Committed)
    }

    #[instrument(skip_all, fields(branch, force))]
    fn push(&self, branch: &str, force: bool) -> Result<()> {
        let mut args = vec!["push", self.remote.as_str(), branch];
        if force {
            args.push("--force");
        }
        self.run_checked(&args)?;
        Ok(())
    }

    #[instrument(skip_all, fields(branch))]
    fn pull(&self, branch: &str) -> Result<()> {
        self.run_checked(&["pull", "--no-rebase", self.remote.as_str(), branch])?;
        Ok(())
    }

    #[instrument(skip_all, fields(branch))]
    fn merge(&self, branch: &str) -> Result<()> {
        self.run_checked(&["merge", "--no-edit", branch])?;
        Ok(())
    }

    fn count_commits(&self) -> Result<u64> {
        let out = self.run_capture(&["rev-list", "--count", "HEAD"])?;
        out.trim()
            .parse()
            .with_context(|| format!("parse commit count '{}'", out.trim()))
    }

    fn list_branches(&self) -> Result<Vec<String>> {
        let out = self.run_capture(&["branch", "--format=%(refname:short)"])?;
        Ok(parse_branch_list(&out))
    }

    #[instrument(skip_all, fields(branch = name))]
    fn delete_remote_branch(&self, name: &str) -> Result<()> {
        self.run_checked(&["push", self.remote.as_str(), "--delete", name])?;
        Ok(())
    }

    #[instrument(skip_all, fields(paths = paths.len()))]
    fn discard_changes(&self, paths: &[&str]) -> Result<()> {
        debug!("discarding uncommitted changes");
        self.run_checked(&["reset", "--hard", "-q"])?;
        if paths.is_empty() {
            return Ok(());
        }
        let mut args = vec!["clean", "-fdq", "--"];
        args.extend_from_slice(paths);
        self.run_checked(&args)?;
        Ok(())
    }
}

fn parse_branch_list(out: &str) -> Vec<String> {
    out.lines()
        .map(|line| line.trim().trim_start_matches("* ").trim())
        .filter(|line| !line.is_empty() && !line.starts_with('('))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_branch_list_with_marker_and_detached_entry() {
        let out = "* main\n  feat/a\n(HEAD detached at 1a2b3c)\n\nfeat/b\n";
        assert_eq!(parse_branch_list(out), vec!["main", "feat/a", "feat/b"]);
    }

    #[test]
    fn not_a_repository_outside_git() {
        let temp = tempfile::tempdir().expect("tempdir");
        let git = Git::new(temp.path());
        assert!(!git.is_repository());
        assert!(git.count_commits().is_err());
    }
}
