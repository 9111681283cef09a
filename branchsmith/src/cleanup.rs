//! Bulk branch cleanup for `branchsmith cleanup`.

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::io::git::VersionControl;

/// Which branches to delete.
#[derive(Debug, Clone, Default)]
pub struct CleanupOptions {
    /// Never deleted; checked out before deleting.
    pub trunk: String,
    /// Only branches starting with this prefix.
    pub prefix: Option<String>,
    /// Explicit branch names. Empty means "every local branch".
    pub branches: Vec<String>,
    pub limit: Option<usize>,
    /// Also delete the selected branches on the remote.
    pub remote: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupFailure {
    pub operation: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub selected: Vec<String>,
    pub local_deleted: usize,
    pub remote_deleted: usize,
    /// Local branches other than trunk left afterwards, when listable.
    pub remaining: Option<usize>,
    pub failures: Vec<CleanupFailure>,
}

/// Pick branches to delete from `listed` (local branches) per `options`.
///
/// Trunk is never selected. Order follows the explicit list when given,
/// otherwise the listing order.
pub fn select_branches(listed: &[String], options: &CleanupOptions) -> Vec<String> {
    let candidates: Vec<&String> = if options.branches.is_empty() {
        listed.iter().collect()
    } else {
        options.branches.iter().collect()
    };
    candidates
        .into_iter()
        .filter(|name| **name != options.trunk)
        .filter(|name| {
            options
                .prefix
                .as_deref()
                .is_none_or(|prefix| name.starts_with(prefix))
        })
        .take(options.limit.unwrap_or(usize::MAX))
        .cloned()
        .collect()
}

/// Delete selected branches locally (and on the remote when requested).
///
/// Individual deletions are best-effort. Only an unavailable branch listing
/// with no explicit branch list is an error.
pub fn cleanup_branches<V: VersionControl>(
    vcs: &V,
    options: &CleanupOptions,
) -> Result<CleanupReport> {
    let mut report = CleanupReport::default();

    if let Err(err) = vcs.checkout(&options.trunk) {
        report.failure(format!("checkout {}", options.trunk), &err);
    }

    let listed = if options.branches.is_empty() {
        vcs.list_branches().context("list local branches")?
    } else {
        Vec::new()
    };
    let selected = select_branches(&listed, options);
    info!(count = selected.len(), "deleting branches");

    for branch in &selected {
        match vcs.delete_branch(branch) {
            Ok(()) => report.local_deleted += 1,
            Err(err) => report.failure(format!("delete_branch {branch}"), &err),
        }
    }

    if options.remote {
        for branch in &selected {
            match vcs.delete_remote_branch(branch) {
                Ok(()) => report.remote_deleted += 1,
                Err(err) => report.failure(format!("delete_remote_branch {branch}"), &err),
            }
        }
    }
    report.selected = selected;

    report.remaining = vcs
        .list_branches()
        .ok()
        .map(|names| names.iter().filter(|name| **name != options.trunk).count());
    info!(
        local = report.local_deleted,
        remote = report.remote_deleted,
        remaining = ?report.remaining,
        "cleanup finished"
    );
    Ok(report)
}

impl CleanupReport {
    fn failure(&mut self, operation: String, err: &anyhow::Error) {
        let error = format!("{err:#}");
        warn!(operation = %operation, error = %error, "cleanup operation failed, continuing");
        self.failures.push(CleanupFailure { operation, error });
    }
}
