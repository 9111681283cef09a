//! Semantic catalog invariants not expressible via JSON Schema.

use std::collections::HashMap;
use std::fmt;
use std::path::{Component, Path};

use crate::core::types::{DuplicatePolicy, Task};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogIssue {
    pub severity: Severity,
    pub message: String,
}

impl CatalogIssue {
    fn error(message: String) -> Self {
        Self {
            severity: Severity::Error,
            message,
        }
    }

    fn warning(message: String) -> Self {
        Self {
            severity: Severity::Warning,
            message,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for CatalogIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(f, "{label}: {}", self.message)
    }
}

/// Check catalog invariants:
/// - Catalog is non-empty (warning)
/// - Task names are valid branch names
/// - Task names are unique (severity per `duplicates`)
/// - Tasks have at least one step (warning)
/// - Commit messages are non-empty
/// - File and directory paths are relative and stay inside the tree
pub fn validate_catalog(tasks: &[Task], duplicates: DuplicatePolicy) -> Vec<CatalogIssue> {
    let mut issues = Vec::new();
    if tasks.is_empty() {
        issues.push(CatalogIssue::warning("catalog has no tasks".to_string()));
        return issues;
    }

    let mut first_seen: HashMap<&str, usize> = HashMap::new();
    for (index, task) in tasks.iter().enumerate() {
        let label = format!("task #{} '{}'", index + 1, task.name);

        if let Err(reason) = check_branch_name(&task.name) {
            issues.push(CatalogIssue::error(format!(
                "{label}: invalid branch name ({reason})"
            )));
        }

        if let Some(first) = first_seen.get(task.name.as_str()) {
            let message = format!("{label}: duplicate name (first used by task #{})", first + 1);
            issues.push(match duplicates {
                DuplicatePolicy::Warn => CatalogIssue::warning(message),
                DuplicatePolicy::Reject => CatalogIssue::error(message),
            });
        } else {
            first_seen.insert(task.name.as_str(), index);
        }

        if task.steps.is_empty() {
            issues.push(CatalogIssue::warning(format!("{label}: has no commit steps")));
        }

        for (step_index, step) in task.steps.iter().enumerate() {
            let step_label = format!("{label} step {}", step_index + 1);
            if step.message.trim().is_empty() {
                issues.push(CatalogIssue::error(format!(
                    "{step_label}: empty commit message"
                )));
            }
            if let Some(dir) = &step.target_directory
                && !is_contained(dir)
            {
                issues.push(CatalogIssue::error(format!(
                    "{step_label}: directory '{}' must be relative without '..'",
                    dir.display()
                )));
            }
            for path in step.paths() {
                if !is_contained(path) || path.as_os_str().is_empty() {
                    issues.push(CatalogIssue::error(format!(
                        "{step_label}: path '{}' must be relative without '..'",
                        path.display()
                    )));
                }
            }
        }
    }
    issues
}

/// True if `path` is relative and never walks above its root.
pub fn is_contained(path: &Path) -> bool {
    path.components()
        .all(|component| matches!(component, Component::Normal(_) | Component::CurDir))
}

/// Subset of `git check-ref-format` rules relevant to generated branch names.
pub fn check_branch_name(name: &str) -> Result<(), &'static str> {
    if name.is_empty() {
        return Err("empty");
    }
    if name.starts_with('-') || name.starts_with('/') {
        return Err("must not start with '-' or '/'");
    }
    if name.ends_with('/') || name.ends_with('.') || name.ends_with(".lock") {
        return Err("must not end with '/', '.' or '.lock'");
    }
    if name.contains("..") || name.contains("//") || name.contains("@{") {
        return Err("must not contain '..', '//' or '@{'");
    }
    if name
        .chars()
        .any(|c| c.is_whitespace() || c.is_control() || "~^:?*[\\".contains(c))
    {
        return Err("contains a forbidden character");
    }
    if name.split('/').any(|part| part.starts_with('.')) {
        return Err("path components must not start with '.'");
    }
    Ok(())
}
