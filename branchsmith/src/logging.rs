//! Diagnostic tracing to stderr, filtered by `RUST_LOG`.
//!
//! Nothing logged here is persisted. The durable record of a run is the JSON
//! report under `.branchsmith/runs/` (see `io::run_report`), which is written
//! whatever the filter says.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_FILTER: &str = "branchsmith=info,warn";

/// Initialize the tracing subscriber.
///
/// Reads `RUST_LOG`; defaults to `branchsmith=info,warn` so every task
/// transition and tolerated failure is visible without configuration.
///
/// # Example
/// ```bash
/// RUST_LOG=branchsmith=debug branchsmith run --builtin workflow --limit 2
/// ```
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    // A second init (e.g. from tests) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .try_init();
}
