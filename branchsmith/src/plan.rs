//! Dry-run listing of a catalog.

use std::fmt::Write as _;

use crate::core::types::{Task, total_steps};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanSummary {
    pub branches: usize,
    pub commits: usize,
}

pub fn summarize(tasks: &[Task]) -> PlanSummary {
    PlanSummary {
        branches: tasks.len(),
        commits: total_steps(tasks),
    }
}

/// Human-readable plan: one block per task, then totals.
///
/// ```text
/// demo  (2 steps)  feat: demo
///   1. feat: add a.txt
///      a.txt  literal (5 bytes)
/// ```
pub fn render_plan(tasks: &[Task]) -> String {
    let mut out = String::new();
    for task in tasks {
        let _ = writeln!(
            out,
            "{}  ({} steps)  {}",
            task.name,
            task.steps.len(),
            task.title
        );
        for (index, step) in task.steps.iter().enumerate() {
            let _ = writeln!(out, "  {}. {}", index + 1, step.message);
            if let Some(dir) = &step.target_directory {
                let _ = writeln!(out, "     {}/  mkdir", dir.display());
            }
            for change in &step.changes {
                let _ = writeln!(
                    out,
                    "     {}  {}",
                    change.path.display(),
                    change.spec.describe()
                );
            }
        }
    }
    let summary = summarize(tasks);
    let _ = writeln!(
        out,
        "total: {} branches, {} commits",
        summary.branches, summary.commits
    );
    out
}
