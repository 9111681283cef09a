//! Side-effecting adapters: filesystem, child processes, git, review service,
//! and on-disk state.

pub mod catalog_store;
pub mod config;
pub mod git;
pub mod process;
pub mod review;
pub mod run_report;
pub mod state;
pub mod worktree;
