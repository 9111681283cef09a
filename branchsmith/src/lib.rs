//! Batch branch synthesizer.
//!
//! A catalog of tasks is replayed against a repository: each task becomes a
//! branch built from trunk, filled by ordered commit steps, pushed, reviewed,
//! merged, and cleaned up. The crate keeps a strict split:
//!
//! - **[`core`]**: Pure, deterministic logic (data model, content computation,
//!   catalog invariants, lifecycle phases, reports). No I/O.
//! - **[`io`]**: Side-effecting adapters (working tree, git, review service,
//!   child processes, config, catalogs, run reports). Traits at the seams so
//!   tests can swap in fakes.
//!
//! Orchestration modules ([`mutate`], [`orchestrate`], [`cleanup`], [`plan`])
//! combine the two to implement CLI commands. [`catalog`] holds the built-in
//! task catalogs.

pub mod catalog;
pub mod cleanup;
pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod mutate;
pub mod orchestrate;
pub mod plan;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
