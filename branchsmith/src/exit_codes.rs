//! Stable exit codes for branchsmith CLI commands.

/// Command succeeded. A `run` exits with this even when tasks recorded
/// tolerated failures, unless `--strict` is set.
pub const OK: i32 = 0;
/// Invalid input or setup: unreadable config, invalid catalog, missing repository.
pub const INVALID: i32 = 1;
/// `run --strict` finished the catalog but some operation failed.
pub const FAILURES: i32 = 4;
