//! Built-in task catalogs.
//!
//! Each generator returns a fresh, deterministic task list; `plan` and
//! `run` accept them anywhere a catalog file is accepted.

mod frontend;
mod generated;

use crate::core::types::Task;

pub use frontend::{COMPONENTS, DOCS, HOOKS, frontend_catalog};
pub use generated::{FEATURES, WORKFLOW_FEATURES, features_catalog, workflow_catalog};

/// Names accepted by [`builtin`].
pub const BUILTIN_NAMES: &[&str] = &["frontend", "features", "workflow"];

/// Build the named built-in catalog.
pub fn builtin(name: &str) -> Option<Vec<Task>> {
    match name {
        "frontend" => Some(frontend_catalog()),
        "features" => Some(features_catalog()),
        "workflow" => Some(workflow_catalog(WORKFLOW_FEATURES)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::invariants::validate_catalog;
    use crate::core::types::DuplicatePolicy;

    #[test]
    fn every_builtin_is_error_free() {
        for name in BUILTIN_NAMES {
            let tasks = builtin(name).expect("builtin exists");
            assert!(!tasks.is_empty(), "{name} is empty");
            let issues = validate_catalog(&tasks, DuplicatePolicy::Reject);
            assert!(
                issues.iter().all(|issue| !issue.is_error()),
                "{name}: {issues:?}"
            );
        }
    }

    #[test]
    fn unknown_builtin_is_none() {
        assert!(builtin("backend").is_none());
    }
}
