//! Mutation engine: applies one commit step's file changes to a working tree.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::core::content::compute_content;
use crate::core::types::{CommitStep, ContentSpec};
use crate::io::worktree::WorkingTree;

/// A file-system operation that failed while applying a step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationFailure {
    pub path: PathBuf,
    pub operation: &'static str,
    pub error: String,
}

/// What `apply_step` did to the working tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepApplication {
    /// Paths written, in application order (repeats allowed).
    pub written: Vec<PathBuf>,
    /// Directories created because they were absent.
    pub created_dirs: Vec<PathBuf>,
    pub failures: Vec<MutationFailure>,
}

impl StepApplication {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    fn fail(&mut self, path: &Path, operation: &'static str, err: &anyhow::Error) {
        warn!(path = %path.display(), operation, error = %format!("{err:#}"), "mutation failed");
        self.failures.push(MutationFailure {
            path: path.to_path_buf(),
            operation,
            error: format!("{err:#}"),
        });
    }
}

/// Apply `step` to `tree`.
///
/// Never returns an error: every failed file operation is logged and recorded
/// in the returned [`StepApplication`], and the remaining changes still run.
/// Changes apply in declaration order, so a later change to the same path
/// sees (and replaces) the earlier one.
pub fn apply_step<W: WorkingTree + ?Sized>(step: &CommitStep, tree: &W) -> StepApplication {
    let mut applied = StepApplication::default();

    if let Some(dir) = &step.target_directory {
        ensure_dir(tree, dir, &mut applied);
    }

    for change in &step.changes {
        if let Some(parent) = change.path.parent()
            && !parent.as_os_str().is_empty()
            && !ensure_dir(tree, parent, &mut applied)
        {
            continue;
        }

        let content = match &change.spec {
            ContentSpec::Literal(_) => compute_content(&change.spec, None),
            ContentSpec::Transform(_) => match tree.read(&change.path) {
                Ok(prior) => compute_content(&change.spec, prior.as_deref()),
                Err(err) => {
                    applied.fail(&change.path, "read", &err);
                    continue;
                }
            },
        };

        match tree.write(&change.path, &content) {
            Ok(()) => {
                debug!(path = %change.path.display(), spec = %change.spec.describe(), bytes = content.len(), "wrote file");
                applied.written.push(change.path.clone());
            }
            Err(err) => applied.fail(&change.path, "write", &err),
        }
    }

    applied
}

/// Create `dir` if missing. Returns false when creation failed.
fn ensure_dir<W: WorkingTree + ?Sized>(tree: &W, dir: &Path, applied: &mut StepApplication) -> bool {
    if tree.dir_exists(dir) {
        return true;
    }
    match tree.create_dir_all(dir) {
        Ok(()) => {
            debug!(dir = %dir.display(), "created directory");
            applied.created_dirs.push(dir.to_path_buf());
            true
        }
        Err(err) => {
            applied.fail(dir, "create_dir", &err);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::worktree::MemoryWorkingTree;

    #[test]
    fn literal_overwrites_and_creates_parents() {
        let tree = MemoryWorkingTree::new().with_file("src/a.txt", "old");
        let step = CommitStep::new("m")
            .with_literal("src/a.txt", "new")
            .with_literal("src/nested/deep/b.txt", "b");
        let applied = apply_step(&step, &tree);
        assert!(applied.is_clean());
        assert_eq!(tree.file("src/a.txt").as_deref(), Some("new"));
        assert_eq!(tree.file("src/nested/deep/b.txt").as_deref(), Some("b"));
        assert_eq!(applied.created_dirs, vec![PathBuf::from("src/nested/deep")]);
    }

    #[test]
    fn disjoint_changes_commute() {
        let forward = CommitStep::new("m")
            .with_literal("a.txt", "a")
            .with_transform("b/b.txt", "append", |prior| format!("{prior}b"));
        let backward = CommitStep::new("m")
            .with_transform("b/b.txt", "append", |prior| format!("{prior}b"))
            .with_literal("a.txt", "a");

        let first = MemoryWorkingTree::new().with_file("b/b.txt", "x");
        let second = MemoryWorkingTree::new().with_file("b/b.txt", "x");
        apply_step(&forward, &first);
        apply_step(&backward, &second);
        assert_eq!(first.snapshot(), second.snapshot());
    }

    #[test]
    fn transform_of_missing_file_matches_empty_file() {
        let step = CommitStep::new("m").with_transform("index.ts", "export", |prior| {
            format!("{prior}export * from './Button';\n")
        });
        let missing = MemoryWorkingTree::new();
        let empty = MemoryWorkingTree::new().with_file("index.ts", "");
        apply_step(&step, &missing);
        apply_step(&step, &empty);
        assert_eq!(missing.file("index.ts"), empty.file("index.ts"));
    }

    #[test]
    fn later_change_to_same_path_wins() {
        let step = CommitStep::new("m")
            .with_literal("a.txt", "x")
            .with_transform("a.txt", "append y", |prior| format!("{prior}y"))
            .with_literal("b.txt", "1")
            .with_literal("b.txt", "2");
        let tree = MemoryWorkingTree::new();
        let applied = apply_step(&step, &tree);
        assert_eq!(tree.file("a.txt").as_deref(), Some("xy"));
        assert_eq!(tree.file("b.txt").as_deref(), Some("2"));
        assert_eq!(applied.written.len(), 4);
    }

    #[test]
    fn directory_only_step_scaffolds_directory() {
        let step = CommitStep::new("chore: scaffold").in_directory("src/components/Button");
        let tree = MemoryWorkingTree::new();
        let applied = apply_step(&step, &tree);
        assert!(tree.dir_exists(Path::new("src/components/Button")));
        assert!(applied.written.is_empty());

        let again = apply_step(&step, &tree);
        assert!(again.created_dirs.is_empty(), "existing dir is left alone");
    }

    #[test]
    fn failures_are_recorded_and_remaining_changes_still_apply() {
        let tree = MemoryWorkingTree::new().with_file("blocker", "file");
        let step = CommitStep::new("m")
            .with_literal("blocker/child.txt", "nope")
            .with_literal("../escape.txt", "nope")
            .with_literal("ok.txt", "fine");
        let applied = apply_step(&step, &tree);
        assert_eq!(applied.failures.len(), 2);
        assert_eq!(applied.failures[0].operation, "create_dir");
        assert_eq!(tree.file("ok.txt").as_deref(), Some("fine"));
    }
}
