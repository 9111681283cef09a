//! Generated micro-commit catalogs: `features` and `workflow`.

use crate::core::types::{CommitStep, Task};

pub const FEATURES: &[&str] = &[
    "wallet-integration",
    "pixel-caching",
    "grid-optimization",
    "color-validation",
    "user-analytics",
    "transaction-batching",
    "event-logging",
    "canvas-export",
    "rate-limiting",
    "secure-api",
    "mobile-responsiveness",
    "dark-mode",
    "pixel-history",
    "undo-redo",
    "multi-select",
    "copy-paste",
    "grid-zoom",
    "minimap",
    "collaborative-cursors",
    "pixel-locking",
    "governance-voting",
    "reward-distribution",
    "staking-logic",
    "nft-minting",
    "marketplace-integration",
    "auction-system",
    "bid-tracking",
    "escrow-service",
    "notification-system",
    "real-time-sync",
    "websocket-handler",
    "chainhooks-integration",
    "wallet-switching",
    "network-detection",
    "gas-estimation",
    "transaction-queue",
    "error-boundary",
    "loading-states",
    "skeleton-screens",
    "toast-notifications",
    "modal-manager",
    "form-validation",
    "input-sanitization",
    "xss-protection",
    "rate-limit-ui",
    "retry-logic",
    "offline-mode",
    "service-worker",
    "pwa-manifest",
    "installability",
    "push-notifications",
    "background-sync",
    "performance-monitoring",
    "error-tracking",
    "analytics-dashboard",
    "user-segmentation",
    "a-b-testing",
    "feature-flags",
    "config-management",
    "environment-variables",
];

/// Number of `workflow/feature-N` branches in the built-in catalog.
pub const WORKFLOW_FEATURES: usize = 100;

const WORKFLOW_STEPS: usize = 8;

const COMMIT_TYPES: [&str; 5] = ["feat", "refactor", "test", "docs", "style"];
const ACTIONS: [&str; 5] = ["implement", "optimize", "enhance", "improve", "add"];
const FILE_KINDS: [&str; 5] = ["core", "utils", "types", "tests", "docs"];

/// Commits for the feature at `index`: 10 to 15, cycling with the index.
pub fn feature_commit_count(index: usize) -> usize {
    10 + index % 6
}

/// One `feat/<feature>` branch per entry in [`FEATURES`].
pub fn features_catalog() -> Vec<Task> {
    FEATURES
        .iter()
        .enumerate()
        .map(|(index, feature)| feature_task(feature, feature_commit_count(index)))
        .collect()
}

fn feature_task(feature: &str, commits: usize) -> Task {
    let ident = feature.replace('-', "_");
    let body = format!(
        "## Overview\nThis PR implements the {feature} functionality with {commits} granular commits.\n\n## Changes\n- Core implementation\n- Utility functions\n- Type definitions\n- Test coverage\n- Documentation\n\n## Testing\nAll tests pass locally."
    );
    let mut task = Task::new(
        format!("feat/{feature}"),
        format!("feat: implement {}", feature.replace('-', " ")),
        body,
    );
    for i in 0..commits {
        let kind = i % 5;
        let action = ACTIONS[kind];
        let path = format!("src/features/{feature}/{}-{i}.ts", FILE_KINDS[kind]);
        let content = format!(
            "// {feature} - {action} step {i}\nexport const {ident}_{i} = () => {{\n  return true;\n}};\n"
        );
        let message = format!(
            "{}({feature}): {action} step {} for production readiness",
            COMMIT_TYPES[kind],
            i + 1
        );
        task = task.with_step(CommitStep::new(message).with_literal(path, content));
    }
    task
}

/// `count` branches named `workflow/feature-1` .. `workflow/feature-<count>`.
pub fn workflow_catalog(count: usize) -> Vec<Task> {
    (1..=count).map(workflow_task).collect()
}

fn workflow_task(n: usize) -> Task {
    let feature = format!("feature-{n}");
    let mut task = Task::new(
        format!("workflow/{feature}"),
        format!("feat: implement {feature} logic"),
        format!("Detailed implementation of {feature}"),
    );
    for j in 0..WORKFLOW_STEPS {
        task = task.with_step(
            CommitStep::new(format!(
                "feat({feature}): perform step {j} for granular architecture"
            ))
            .with_literal(
                format!("src/gen/{feature}/step-{j}.txt"),
                format!("Step {j} for {feature}\n"),
            ),
        );
    }
    task
}
