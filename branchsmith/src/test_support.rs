//! Test-only fakes and fixtures.
//!
//! [`RecordingVcs`] and [`RecordingReview`] simulate the collaborators in
//! memory and record every call; [`TestRepo`] builds a real git repository
//! with a bare `origin` for end-to-end tests.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use tempfile::TempDir;

use crate::core::types::MergeStrategy;
use crate::io::git::{CommitOutcome, Git, VersionControl};
use crate::io::process::{ProcessLimits, run_checked};
use crate::io::review::{ReviewHandle, ReviewRequest, ReviewService};

#[derive(Debug, Default)]
struct VcsState {
    current: String,
    /// Branch name to commit messages, oldest first.
    branches: BTreeMap<String, Vec<String>>,
    calls: Vec<String>,
    fail_on: BTreeSet<String>,
    empty_messages: BTreeSet<String>,
}

/// In-memory version-control fake.
///
/// Branches are lists of commit messages. A call listed via [`fail_on`]
/// is recorded and then fails without changing state.
///
/// [`fail_on`]: RecordingVcs::fail_on
#[derive(Debug, Default)]
pub struct RecordingVcs {
    state: RefCell<VcsState>,
}

impl RecordingVcs {
    /// Repository on `trunk` with `commits` seed commits (`seed 1`, ...).
    pub fn with_history(trunk: &str, commits: usize) -> Self {
        let messages = (1..=commits).map(|n| format!("seed {n}")).collect();
        let vcs = Self::default();
        {
            let mut state = vcs.state.borrow_mut();
            state.current = trunk.to_string();
            state.branches.insert(trunk.to_string(), messages);
        }
        vcs
    }

    pub fn seed_branch(&self, name: &str, messages: &[&str]) {
        self.state.borrow_mut().branches.insert(
            name.to_string(),
            messages.iter().map(|m| m.to_string()).collect(),
        );
    }

    /// Make the exact call string (e.g. `push demo --force`) fail.
    pub fn fail_on(&self, call: &str) {
        self.state.borrow_mut().fail_on.insert(call.to_string());
    }

    /// Report `NothingToCommit` for commits with this message.
    pub fn nothing_to_commit(&self, message: &str) {
        self.state
            .borrow_mut()
            .empty_messages
            .insert(message.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.borrow().calls.clone()
    }

    pub fn messages_on(&self, branch: &str) -> Vec<String> {
        self.state
            .borrow()
            .branches
            .get(branch)
            .cloned()
            .unwrap_or_default()
    }

    pub fn branch_names(&self) -> Vec<String> {
        self.state.borrow().branches.keys().cloned().collect()
    }

    pub fn current(&self) -> String {
        self.state.borrow().current.clone()
    }

    fn record(&self, call: String) -> Result<()> {
        let mut state = self.state.borrow_mut();
        let fails = state.fail_on.contains(&call);
        state.calls.push(call.clone());
        if fails {
            return Err(anyhow!("injected failure: {call}"));
        }
        Ok(())
    }
}

impl VersionControl for RecordingVcs {
    fn checkout(&self, branch: &str) -> Result<()> {
        self.record(format!("checkout {branch}"))?;
        let mut state = self.state.borrow_mut();
        if !state.branches.contains_key(branch) {
            return Err(anyhow!("pathspec '{branch}' did not match"));
        }
        state.current = branch.to_string();
        Ok(())
    }

    fn create_branch(&self, name: &str) -> Result<()> {
        self.record(format!("create_branch {name}"))?;
        let mut state = self.state.borrow_mut();
        if state.branches.contains_key(name) {
            return Err(anyhow!("a branch named '{name}' already exists"));
        }
        let base = state
            .branches
            .get(&state.current)
            .cloned()
            .unwrap_or_default();
        state.branches.insert(name.to_string(), base);
        state.current = name.to_string();
        Ok(())
    }

    fn delete_branch(&self, name: &str) -> Result<()> {
        self.record(format!("delete_branch {name}"))?;
        let mut state = self.state.borrow_mut();
        if state.current == name {
            return Err(anyhow!("cannot delete checked-out branch '{name}'"));
        }
        state
            .branches
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| anyhow!("branch '{name}' not found"))
    }

    fn add(&self, paths: &[&str]) -> Result<()> {
        self.record(format!("add {}", paths.join(" ")))
    }

    fn commit(&self, message: &str, _allow_empty: bool) -> Result<CommitOutcome> {
        self.record(format!("commit {message}"))?;
        let mut state = self.state.borrow_mut();
        if state.empty_messages.contains(message) {
            return Ok(CommitOutcome::NothingToCommit);
        }
        let current = state.current.clone();
        state
            .branches
            .entry(current)
            .or_default()
            .push(message.to_string());
        Ok(CommitOutcome::Committed)
    }

    fn push(&self, branch: &str, force: bool) -> Result<()> {
        let flag = if force { " --force" } else { "" };
        self.record(format!("push {branch}{flag}"))
    }

    fn pull(&self, branch: &str) -> Result<()> {
        self.record(format!("pull {branch}"))
    }

    fn merge(&self, branch: &str) -> Result<()> {
        self.record(format!("merge {branch}"))?;
        let mut state = self.state.borrow_mut();
        let incoming = state
            .branches
            .get(branch)
            .cloned()
            .ok_or_else(|| anyhow!("branch '{branch}' not found"))?;
        let current = state.current.clone();
        let target = state.branches.entry(current).or_default();
        for message in incoming {
            if !target.contains(&message) {
                target.push(message);
            }
        }
        Ok(())
    }

    fn count_commits(&self) -> Result<u64> {
        self.record("count_commits".to_string())?;
        let state = self.state.borrow();
        state
            .branches
            .get(&state.current)
            .map(|messages| messages.len() as u64)
            .ok_or_else(|| anyhow!("unknown revision HEAD"))
    }

    fn list_branches(&self) -> Result<Vec<String>> {
        self.record("list_branches".to_string())?;
        Ok(self.branch_names())
    }

    fn delete_remote_branch(&self, name: &str) -> Result<()> {
        self.record(format!("delete_remote_branch {name}"))
    }

    fn discard_changes(&self, paths: &[&str]) -> Result<()> {
        self.record(format!("discard_changes {}", paths.join(" ")))
    }
}

/// Review-service fake with optional injected failures.
#[derive(Debug, Default)]
pub struct RecordingReview {
    calls: RefCell<Vec<String>>,
    requests: RefCell<Vec<ReviewRequest>>,
    open_error: Option<String>,
    merge_error: Option<String>,
    url_base: Option<String>,
}

impl RecordingReview {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_open(mut self, error: &str) -> Self {
        self.open_error = Some(error.to_string());
        self
    }

    pub fn fail_merge(mut self, error: &str) -> Self {
        self.merge_error = Some(error.to_string());
        self
    }

    /// Hand out `<base>/<n>` URLs for opened reviews.
    pub fn with_urls(mut self, base: &str) -> Self {
        self.url_base = Some(base.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn requests(&self) -> Vec<ReviewRequest> {
        self.requests.borrow().clone()
    }
}

impl ReviewService for RecordingReview {
    fn open_review(&self, request: &ReviewRequest) -> Result<ReviewHandle> {
        self.calls
            .borrow_mut()
            .push(format!("open {} -> {}", request.branch, request.base));
        self.requests.borrow_mut().push(request.clone());
        if let Some(error) = &self.open_error {
            return Err(anyhow!("{error}"));
        }
        let number = self.requests.borrow().len();
        Ok(ReviewHandle {
            branch: request.branch.clone(),
            url: self.url_base.as_ref().map(|base| format!("{base}/{number}")),
        })
    }

    fn merge_review(
        &self,
        handle: &ReviewHandle,
        strategy: MergeStrategy,
        delete_source_branch: bool,
    ) -> Result<()> {
        let delete = if delete_source_branch {
            " --delete-branch"
        } else {
            ""
        };
        self.calls.borrow_mut().push(format!(
            "merge {} --{}{delete}",
            handle.selector(),
            strategy.as_str()
        ));
        match &self.merge_error {
            Some(error) => Err(anyhow!("{error}")),
            None => Ok(()),
        }
    }
}

/// Review service that merges locally and pushes trunk, standing in for a
/// hosted review service against a bare `origin`.
#[derive(Debug, Clone)]
pub struct LocalMergeReview {
    git: Git,
    trunk: String,
}

impl LocalMergeReview {
    pub fn new(git: Git, trunk: &str) -> Self {
        Self {
            git,
            trunk: trunk.to_string(),
        }
    }
}

impl ReviewService for LocalMergeReview {
    fn open_review(&self, request: &ReviewRequest) -> Result<ReviewHandle> {
        Ok(ReviewHandle {
            branch: request.branch.clone(),
            url: None,
        })
    }

    fn merge_review(
        &self,
        handle: &ReviewHandle,
        _strategy: MergeStrategy,
        delete_source_branch: bool,
    ) -> Result<()> {
        self.git.checkout(&self.trunk)?;
        self.git.merge(&handle.branch)?;
        self.git.push(&self.trunk, false)?;
        if delete_source_branch {
            self.git.delete_remote_branch(&handle.branch)?;
        }
        Ok(())
    }
}

/// Real git repository in a temp dir, with a bare repository as `origin`.
pub struct TestRepo {
    _temp: TempDir,
    root: PathBuf,
    origin: PathBuf,
}

impl TestRepo {
    /// Empty repository on an unborn `main`.
    pub fn new() -> Result<Self> {
        let temp = tempfile::tempdir().context("create tempdir")?;
        let root = temp.path().join("work");
        let origin = temp.path().join("origin.git");
        fs::create_dir_all(&root).context("create work dir")?;
        fs::create_dir_all(&origin).context("create origin dir")?;

        git_in(&origin, &["init", "--bare", "-b", "main"])?;
        git_in(&root, &["init", "-b", "main"])?;
        git_in(&root, &["config", "user.email", "branchsmith@example.com"])?;
        git_in(&root, &["config", "user.name", "branchsmith"])?;
        git_in(&root, &["config", "commit.gpgsign", "false"])?;
        let origin_str = origin.to_string_lossy().to_string();
        git_in(&root, &["remote", "add", "origin", &origin_str])?;

        Ok(Self {
            _temp: temp,
            root,
            origin,
        })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    pub fn origin(&self) -> &Path {
        &self.origin
    }

    pub fn git(&self) -> Git {
        Git::new(&self.root)
    }

    /// Run `git` in the work tree and return stdout.
    pub fn run_git(&self, args: &[&str]) -> Result<String> {
        git_in(&self.root, args)
    }

    /// Branch names present on `origin`.
    pub fn remote_branches(&self) -> Result<Vec<String>> {
        let out = git_in(&self.origin, &["branch", "--format=%(refname:short)"])?;
        Ok(out
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// Commit subjects reachable from `rev`, oldest first.
    pub fn log_subjects(&self, rev: &str) -> Result<Vec<String>> {
        let out = self.run_git(&["log", "--reverse", "--format=%s", rev])?;
        Ok(out.lines().map(str::to_string).collect())
    }

    /// Contents of `path` at `rev`.
    pub fn show(&self, rev: &str, path: &str) -> Result<String> {
        self.run_git(&["show", &format!("{rev}:{path}")])
    }
}

fn git_in(dir: &Path, args: &[&str]) -> Result<String> {
    let output = run_checked("git", args, dir, &ProcessLimits::default())?;
    Ok(output.stdout_text())
}
