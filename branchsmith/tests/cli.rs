//! CLI tests: spawn the binary and check exit codes and artifacts.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use branchsmith::exit_codes;
use branchsmith::io::run_report::load_run_report;
use branchsmith::io::state::{InitOptions, StatePaths, init_state};
use branchsmith::test_support::TestRepo;

fn branchsmith(repo: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_branchsmith"))
        .arg("--repo")
        .arg(repo)
        .args(args)
        .env("RUST_LOG", "off")
        .output()
        .expect("spawn branchsmith")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

#[test]
fn init_then_validate_sample_catalog() {
    let temp = tempfile::tempdir().expect("tempdir");
    let init = branchsmith(temp.path(), &["init"]);
    assert_eq!(init.status.code(), Some(exit_codes::OK));

    let again = branchsmith(temp.path(), &["init"]);
    assert_eq!(again.status.code(), Some(exit_codes::INVALID));

    let catalog = temp.path().join(".branchsmith/catalog.json");
    let validate = branchsmith(
        temp.path(),
        &["validate", "--catalog", catalog.to_str().expect("utf8")],
    );
    assert_eq!(validate.status.code(), Some(exit_codes::OK));
    assert_eq!(stdout(&validate), "ok: 1 tasks, 3 commits\n");
}

#[test]
fn plan_builtin_prints_totals() {
    let temp = tempfile::tempdir().expect("tempdir");
    let output = branchsmith(temp.path(), &["plan", "--builtin", "workflow"]);
    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let text = stdout(&output);
    assert!(text.starts_with("workflow/feature-1  (8 steps)"));
    assert!(text.ends_with("total: 100 branches, 800 commits\n"));
}

#[test]
fn invalid_catalog_exits_invalid() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = temp.path().join("bad.json");
    fs::write(
        &path,
        r#"{"version": 1, "tasks": [{"name": "x", "title": "t", "steps": [
            {"message": "m", "changes": [{"path": "../outside.txt", "literal": "x"}]}
        ]}]}"#,
    )
    .expect("write");
    let output = branchsmith(
        temp.path(),
        &["validate", "--catalog", path.to_str().expect("utf8")],
    );
    assert_eq!(output.status.code(), Some(exit_codes::INVALID));
    assert!(String::from_utf8_lossy(&output.stderr).contains("outside.txt"));
}

#[test]
fn run_without_review_pushes_branch_and_writes_report() {
    let repo = TestRepo::new().expect("repo");
    let paths = init_state(repo.path(), &InitOptions { force: false }).expect("init");
    let catalog = paths.catalog_path.to_str().expect("utf8").to_string();

    let output = branchsmith(repo.path(), &["run", "--catalog", &catalog, "--no-review"]);

    assert_eq!(output.status.code(), Some(exit_codes::OK), "{output:?}");
    assert_eq!(
        repo.log_subjects("demo").expect("log"),
        vec!["chore: initial commit", "feat: add a.txt", "feat: extend a.txt"]
    );
    assert_eq!(repo.show("demo", "a.txt").expect("show"), "hello\nworld");
    assert!(repo.show("demo", ".branchsmith/config.toml").is_err());
    assert!(
        repo.remote_branches()
            .expect("remote")
            .contains(&"demo".to_string())
    );

    let runs = StatePaths::new(repo.path()).runs_dir;
    let run_dir = fs::read_dir(&runs)
        .expect("runs dir")
        .next()
        .expect("one run")
        .expect("entry")
        .path();
    let report = load_run_report(&run_dir.join("report.json")).expect("report");
    assert!(report.bootstrapped);
    assert_eq!(report.tasks[0].commits_created, 2);
    assert_eq!(report.tasks[0].commits_skipped, 1);
}

#[test]
fn strict_run_with_failed_pushes_exits_with_failures_code() {
    let repo = TestRepo::new().expect("repo");
    let paths = init_state(repo.path(), &InitOptions { force: false }).expect("init");
    let catalog = paths.catalog_path.to_str().expect("utf8").to_string();

    let lenient = branchsmith(
        repo.path(),
        &["run", "--catalog", &catalog, "--no-review", "--remote", "nowhere"],
    );
    assert_eq!(lenient.status.code(), Some(exit_codes::OK));

    let strict = branchsmith(
        repo.path(),
        &[
            "run",
            "--catalog",
            &catalog,
            "--no-review",
            "--remote",
            "nowhere",
            "--strict",
        ],
    );
    assert_eq!(strict.status.code(), Some(exit_codes::FAILURES));

    // Both runs keep their own report even when started within one second.
    let reports = fs::read_dir(&paths.runs_dir)
        .expect("runs dir")
        .filter_map(Result::ok)
        .filter(|entry| entry.path().join("report.json").is_file())
        .count();
    assert_eq!(reports, 2);
}

#[test]
fn run_outside_repository_is_invalid() {
    let temp = tempfile::tempdir().expect("tempdir");
    let output = branchsmith(temp.path(), &["run", "--builtin", "workflow", "--limit", "1"]);
    assert_eq!(output.status.code(), Some(exit_codes::INVALID));
    assert!(String::from_utf8_lossy(&output.stderr).contains("not a git repository"));
}
