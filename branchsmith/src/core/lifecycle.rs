//! Per-task branch lifecycle phases.
//!
//! ```text
//! Trunk -> BranchReset -> BranchCreated -> Committing* -> Pushed -> ReviewOpened -> Merged -> Trunk
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPhase {
    Trunk,
    BranchReset,
    BranchCreated,
    Committing,
    Pushed,
    ReviewOpened,
    Merged,
}

impl TaskPhase {
    /// Successor phase; `Merged` wraps back to `Trunk`.
    ///
    /// `Committing` advances to `Pushed`; repetition per step is the
    /// orchestrator's concern.
    pub fn next(self) -> Self {
        match self {
            Self::Trunk => Self::BranchReset,
            Self::BranchReset => Self::BranchCreated,
            Self::BranchCreated => Self::Committing,
            Self::Committing => Self::Pushed,
            Self::Pushed => Self::ReviewOpened,
            Self::ReviewOpened => Self::Merged,
            Self::Merged => Self::Trunk,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trunk => "trunk",
            Self::BranchReset => "branch_reset",
            Self::BranchCreated => "branch_created",
            Self::Committing => "committing",
            Self::Pushed => "pushed",
            Self::ReviewOpened => "review_opened",
            Self::Merged => "merged",
        }
    }
}

impl fmt::Display for TaskPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
