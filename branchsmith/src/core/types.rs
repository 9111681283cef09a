//! Task data model shared by the mutation engine and the orchestrator.
//!
//! Tasks are immutable value data: they are built once (from a catalog file or
//! a built-in generator) and consumed in catalog order.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Pure content function: prior file content in, new file content out.
pub type TransformFn = dyn Fn(&str) -> String + Send + Sync;

/// A labelled, shareable content transform.
///
/// The label only feeds logs and `plan` output; equality of transforms is
/// never checked.
#[derive(Clone)]
pub struct Transform {
    label: String,
    func: Arc<TransformFn>,
}

impl Transform {
    pub fn new(
        label: impl Into<String>,
        func: impl Fn(&str) -> String + Send + Sync + 'static,
    ) -> Self {
        Self {
            label: label.into(),
            func: Arc::new(func),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn apply(&self, prior: &str) -> String {
        (self.func)(prior)
    }
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transform")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

/// How a target file's new content is computed.
#[derive(Debug, Clone)]
pub enum ContentSpec {
    /// Overwrite with exactly this text.
    Literal(String),
    /// Compute from the current on-disk content ("" when the file is absent).
    Transform(Transform),
}

impl ContentSpec {
    pub fn literal(text: impl Into<String>) -> Self {
        Self::Literal(text.into())
    }

    pub fn transform(
        label: impl Into<String>,
        func: impl Fn(&str) -> String + Send + Sync + 'static,
    ) -> Self {
        Self::Transform(Transform::new(label, func))
    }

    /// Short human-readable description for logs and plans.
    pub fn describe(&self) -> String {
        match self {
            Self::Literal(text) => format!("literal ({} bytes)", text.len()),
            Self::Transform(transform) => format!("transform ({})", transform.label()),
        }
    }
}

/// One declared file change inside a commit step.
#[derive(Debug, Clone)]
pub struct FileChange {
    pub path: PathBuf,
    pub spec: ContentSpec,
}

/// One commit: optional directory scaffold, ordered file changes, message.
///
/// Changes apply in declaration order; a later change to the same path wins.
#[derive(Debug, Clone, Default)]
pub struct CommitStep {
    pub message: String,
    pub target_directory: Option<PathBuf>,
    pub changes: Vec<FileChange>,
}

impl CommitStep {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            target_directory: None,
            changes: Vec::new(),
        }
    }

    /// Ensure `dir` exists before any change is applied.
    pub fn in_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.target_directory = Some(dir.into());
        self
    }

    pub fn with_change(mut self, path: impl Into<PathBuf>, spec: ContentSpec) -> Self {
        self.changes.push(FileChange {
            path: path.into(),
            spec,
        });
        self
    }

    pub fn with_literal(self, path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        self.with_change(path, ContentSpec::literal(text))
    }

    pub fn with_transform(
        self,
        path: impl Into<PathBuf>,
        label: impl Into<String>,
        func: impl Fn(&str) -> String + Send + Sync + 'static,
    ) -> Self {
        self.with_change(path, ContentSpec::transform(label, func))
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.changes.iter().map(|change| change.path.as_path())
    }
}

/// A unit of work producing one branch and one review.
#[derive(Debug, Clone)]
pub struct Task {
    /// Branch name; also the task identity.
    pub name: String,
    pub title: String,
    pub body: String,
    pub steps: Vec<CommitStep>,
}

impl Task {
    pub fn new(name: impl Into<String>, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: title.into(),
            body: body.into(),
            steps: Vec::new(),
        }
    }

    pub fn with_step(mut self, step: CommitStep) -> Self {
        self.steps.push(step);
        self
    }
}

/// Total number of commit steps across a catalog.
pub fn total_steps(tasks: &[Task]) -> usize {
    tasks.iter().map(|task| task.steps.len()).sum()
}

/// Review merge strategy passed to the review service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeStrategy {
    #[default]
    Merge,
    Squash,
    Rebase,
}

impl MergeStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Merge => "merge",
            Self::Squash => "squash",
            Self::Rebase => "rebase",
        }
    }
}

/// What to do when a step leaves nothing staged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmptyCommitPolicy {
    /// Attempt the commit; "nothing to commit" is recorded as skipped.
    #[default]
    Skip,
    /// Create an empty commit so every step yields exactly one commit.
    Allow,
}

impl EmptyCommitPolicy {
    pub fn allows_empty(self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// How repeated task names in one catalog are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Each occurrence re-runs and clobbers the earlier branch.
    #[default]
    Warn,
    /// Refuse to run a catalog with repeated names.
    Reject,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_keeps_declaration_order() {
        let step = CommitStep::new("feat: add files")
            .with_literal("b.txt", "b")
            .with_literal("a.txt", "a")
            .with_transform("b.txt", "append", |cur| format!("{cur}!"));
        let paths: Vec<&Path> = step.paths().collect();
        assert_eq!(
            paths,
            vec![Path::new("b.txt"), Path::new("a.txt"), Path::new("b.txt")]
        );
    }

    #[test]
    fn describe_names_the_variant() {
        assert_eq!(ContentSpec::literal("hey").describe(), "literal (3 bytes)");
        let spec = ContentSpec::transform("append export", |cur| cur.to_string());
        assert_eq!(spec.describe(), "transform (append export)");
    }

    #[test]
    fn total_steps_sums_all_tasks() {
        let tasks = vec![
            Task::new("a", "A", "")
                .with_step(CommitStep::new("one"))
                .with_step(CommitStep::new("two")),
            Task::new("b", "B", "").with_step(CommitStep::new("three")),
        ];
        assert_eq!(total_steps(&tasks), 3);
    }
}
