//! Run report persistence (`.branchsmith/runs/<run-id>/report.json`).

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::debug;

use crate::core::report::RunReport;

/// Path of the report file for `run_id` under `runs_dir`.
pub fn report_path(runs_dir: &Path, run_id: &str) -> PathBuf {
    runs_dir.join(run_id).join("report.json")
}

const MAX_RUN_ID_ATTEMPTS: u32 = 1000;

/// Claim a fresh run directory under `runs_dir` and return its id.
///
/// `base` is used as-is when free; otherwise `-2`, `-3`, ... is appended, so
/// two runs started within the same second never share a report.
pub fn reserve_run_id(runs_dir: &Path, base: &str) -> Result<String> {
    fs::create_dir_all(runs_dir)
        .with_context(|| format!("create directory {}", runs_dir.display()))?;
    for attempt in 1..=MAX_RUN_ID_ATTEMPTS {
        let candidate = if attempt == 1 {
            base.to_string()
        } else {
            format!("{base}-{attempt}")
        };
        let dir = runs_dir.join(&candidate);
        match fs::create_dir(&dir) {
            Ok(()) => {
                debug!(run_id = %candidate, "reserved run directory");
                return Ok(candidate);
            }
            Err(err) if err.kind() == ErrorKind::AlreadyExists => continue,
            Err(err) => {
                return Err(err).with_context(|| format!("create run dir {}", dir.display()));
            }
        }
    }
    bail!(
        "no free run id for '{base}' after {MAX_RUN_ID_ATTEMPTS} attempts in {}",
        runs_dir.display()
    )
}

pub fn load_run_report(path: &Path) -> Result<RunReport> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read run report {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("parse run report {}", path.display()))
}

/// Atomically write the report (temp file + rename), creating the run dir.
pub fn write_run_report(runs_dir: &Path, report: &RunReport) -> Result<PathBuf> {
    let path = report_path(runs_dir, &report.run_id);
    debug!(path = %path.display(), tasks = report.tasks.len(), "writing run report");
    let mut buf = serde_json::to_string_pretty(report).context("serialize run report")?;
    buf.push('\n');
    let parent = path
        .parent()
        .with_context(|| format!("run report path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, buf)
        .with_context(|| format!("write temp run report {}", tmp_path.display()))?;
    fs::rename(&tmp_path, &path)
        .with_context(|| format!("replace run report {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::lifecycle::TaskPhase;
    use crate::core::report::{ReviewOutcome, TaskReport};

    #[test]
    fn run_report_round_trips() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut report = RunReport::new("20260101T000000Z", "2026-01-01T00:00:00Z");
        let mut task = TaskReport::new("feat/x");
        task.commits_created = 2;
        task.review = ReviewOutcome::Failed {
            error: "already merged".to_string(),
        };
        task.record_failure(TaskPhase::Pushed, "review feat/x", "already merged");
        task.finish();
        report.tasks.push(task);
        report.finished_at = Some("2026-01-01T00:00:05Z".to_string());

        let path = write_run_report(temp.path(), &report).expect("write");
        assert_eq!(path, temp.path().join("20260101T000000Z/report.json"));
        assert!(!path.with_extension("json.tmp").exists());
        assert_eq!(load_run_report(&path).expect("load"), report);
    }

    #[test]
    fn reserved_run_ids_never_collide() {
        let temp = tempfile::tempdir().expect("tempdir");
        let runs = temp.path().join("runs");
        let first = reserve_run_id(&runs, "run-20260101_000000").expect("first");
        let second = reserve_run_id(&runs, "run-20260101_000000").expect("second");
        let third = reserve_run_id(&runs, "run-20260101_000000").expect("third");
        assert_eq!(first, "run-20260101_000000");
        assert_eq!(second, "run-20260101_000000-2");
        assert_eq!(third, "run-20260101_000000-3");

        let report = RunReport::new(second.as_str(), "2026-01-01T00:00:00Z");
        let path = write_run_report(&runs, &report).expect("write");
        assert_eq!(path, runs.join("run-20260101_000000-2/report.json"));
        assert!(!report_path(&runs, &first).exists());
    }
}
