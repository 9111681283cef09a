//! Batch branch synthesizer CLI.
//!
//! Replays a task catalog against a git repository: one branch per task,
//! one commit per step, then push, review, merge, and back to trunk.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use branchsmith::catalog::{BUILTIN_NAMES, builtin};
use branchsmith::cleanup::{CleanupOptions, cleanup_branches};
use branchsmith::core::invariants::validate_catalog;
use branchsmith::core::types::{DuplicatePolicy, Task, total_steps};
use branchsmith::exit_codes;
use branchsmith::io::catalog_store::load_catalog;
use branchsmith::io::config::{BranchsmithConfig, load_config};
use branchsmith::io::git::Git;
use branchsmith::io::review::GhReviewService;
use branchsmith::io::run_report::{reserve_run_id, write_run_report};
use branchsmith::io::state::{InitOptions, StatePaths, ensure_state_dir, init_state};
use branchsmith::io::worktree::FsWorkingTree;
use branchsmith::logging;
use branchsmith::orchestrate::{Orchestrator, RunOptions, StopSignal, new_run_id};
use branchsmith::plan::{render_plan, summarize};
use clap::builder::PossibleValuesParser;
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};

#[derive(Parser)]
#[command(
    name = "branchsmith",
    version,
    about = "Synthesize task branches and drive them through review and merge"
)]
struct Cli {
    /// Repository root.
    #[arg(long, global = true, default_value = ".")]
    repo: PathBuf,

    /// Config file (default: <repo>/.branchsmith/config.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

/// Where tasks come from: a catalog file or a built-in generator.
#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
struct CatalogSource {
    /// JSON catalog file.
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Built-in catalog name.
    #[arg(long, value_parser = PossibleValuesParser::new(BUILTIN_NAMES.iter().copied()))]
    builtin: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Create `.branchsmith/` with default config and a sample catalog.
    Init {
        /// Overwrite existing files.
        #[arg(short, long)]
        force: bool,
    },
    /// Check a catalog against the schema and invariants.
    Validate {
        #[command(flatten)]
        source: CatalogSource,
    },
    /// Print every branch and commit a run would create, without touching git.
    Plan {
        #[command(flatten)]
        source: CatalogSource,
    },
    /// Replay the catalog against the repository.
    Run {
        #[command(flatten)]
        source: CatalogSource,

        /// Only run tasks with this name (repeatable).
        #[arg(long = "only", value_name = "NAME")]
        only: Vec<String>,

        /// Process at most N tasks.
        #[arg(long, value_name = "N")]
        limit: Option<usize>,

        /// Override the configured trunk branch.
        #[arg(long)]
        trunk: Option<String>,

        /// Override the configured remote.
        #[arg(long)]
        remote: Option<String>,

        /// Do not push task branches.
        #[arg(long)]
        no_push: bool,

        /// Do not open or merge reviews.
        #[arg(long)]
        no_review: bool,

        /// Exit with a distinct code when any operation failed.
        #[arg(long)]
        strict: bool,
    },
    /// Delete local (and optionally remote) branches other than trunk.
    Cleanup {
        /// Only branches starting with this prefix.
        #[arg(long)]
        prefix: Option<String>,

        /// Delete exactly these branches (repeatable).
        #[arg(long = "branch", value_name = "BRANCH")]
        branches: Vec<String>,

        /// Delete at most N branches.
        #[arg(long, value_name = "N")]
        limit: Option<usize>,

        /// Also delete the branches on the remote.
        #[arg(long)]
        remote: bool,
    },
}

fn main() {
    logging::init();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::INVALID);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    let paths = StatePaths::new(&cli.repo);
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| paths.config_path.clone());
    match cli.command {
        Command::Init { force } => cmd_init(&cli.repo, force),
        Command::Validate { source } => {
            let cfg = load_config(&config_path)?;
            cmd_validate(&source, &cfg)
        }
        Command::Plan { source } => {
            let cfg = load_config(&config_path)?;
            cmd_plan(&source, &cfg)
        }
        Command::Run {
            source,
            only,
            limit,
            trunk,
            remote,
            no_push,
            no_review,
            strict,
        } => {
            let mut cfg = load_config(&config_path)?;
            if let Some(trunk) = trunk {
                cfg.trunk = trunk;
            }
            if let Some(remote) = remote {
                cfg.remote = remote;
            }
            if no_push {
                cfg.push = false;
            }
            if no_review {
                cfg.open_reviews = false;
            }
            cfg.validate().context("invalid command-line overrides")?;
            cmd_run(&paths, &cfg, &source, &only, limit, strict)
        }
        Command::Cleanup {
            prefix,
            branches,
            limit,
            remote,
        } => {
            let cfg = load_config(&config_path)?;
            let options = CleanupOptions {
                trunk: cfg.trunk.clone(),
                prefix,
                branches,
                limit,
                remote,
            };
            cmd_cleanup(&cli.repo, &cfg, &options)
        }
    }
}

fn cmd_init(repo: &Path, force: bool) -> Result<i32> {
    let paths = init_state(repo, &InitOptions { force })?;
    println!("initialized {}", paths.state_dir.display());
    println!("  config:  {}", paths.config_path.display());
    println!("  catalog: {}", paths.catalog_path.display());
    Ok(exit_codes::OK)
}

fn cmd_validate(source: &CatalogSource, cfg: &BranchsmithConfig) -> Result<i32> {
    let tasks = load_tasks(source)?;
    check_catalog(&tasks, cfg.duplicate_tasks)?;
    println!("ok: {} tasks, {} commits", tasks.len(), total_steps(&tasks));
    Ok(exit_codes::OK)
}

fn cmd_plan(source: &CatalogSource, cfg: &BranchsmithConfig) -> Result<i32> {
    let tasks = load_tasks(source)?;
    check_catalog(&tasks, cfg.duplicate_tasks)?;
    print!("{}", render_plan(&tasks));
    Ok(exit_codes::OK)
}

fn cmd_run(
    paths: &StatePaths,
    cfg: &BranchsmithConfig,
    source: &CatalogSource,
    only: &[String],
    limit: Option<usize>,
    strict: bool,
) -> Result<i32> {
    let tasks = select_tasks(load_tasks(source)?, only, limit)?;
    check_catalog(&tasks, cfg.duplicate_tasks)?;

    let limits = cfg.process_limits();
    let git = Git::new(&paths.root)
        .with_remote(&cfg.remote)
        .with_limits(limits);
    if !git.is_repository() {
        bail!("{} is not a git repository", paths.root.display());
    }
    ensure_state_dir(paths)?;
    if paths.stop_path.exists() {
        bail!(
            "{} exists; remove it to start a run",
            paths.stop_path.display()
        );
    }

    let review = GhReviewService::new(&paths.root, limits);
    let tree = FsWorkingTree::new(&paths.root);
    let options = RunOptions::from_config(cfg)?;
    let stop = StopSignal::new().with_stop_file(&paths.stop_path);
    let orchestrator = Orchestrator::new(&git, &review, &tree, options).with_stop(stop);

    let run_id = reserve_run_id(&paths.runs_dir, &new_run_id())?;
    let plan = summarize(&tasks);
    info!(run_id = %run_id, branches = plan.branches, commits = plan.commits, "starting run");
    let report = orchestrator.run(&tasks, &run_id);
    let report_path = write_run_report(&paths.runs_dir, &report)?;

    let summary = report.summary();
    println!(
        "run {}: {} tasks ({} completed, {} with warnings, {} aborted), {} merged, {} commits ({} skipped), {} failures{}",
        report.run_id,
        summary.tasks,
        summary.completed,
        summary.with_warnings,
        summary.aborted,
        summary.merged,
        summary.commits_created,
        summary.commits_skipped,
        summary.failures,
        if report.cancelled { ", cancelled" } else { "" }
    );
    println!("report: {}", report_path.display());

    if strict && report.has_failures() {
        return Ok(exit_codes::FAILURES);
    }
    Ok(exit_codes::OK)
}

fn cmd_cleanup(repo: &Path, cfg: &BranchsmithConfig, options: &CleanupOptions) -> Result<i32> {
    let git = Git::new(repo)
        .with_remote(&cfg.remote)
        .with_limits(cfg.process_limits());
    if !git.is_repository() {
        bail!("{} is not a git repository", repo.display());
    }
    let report = cleanup_branches(&git, options)?;
    println!(
        "deleted {} local and {} remote branches ({} selected)",
        report.local_deleted,
        report.remote_deleted,
        report.selected.len()
    );
    if let Some(remaining) = report.remaining {
        println!("remaining local branches: {remaining}");
    }
    Ok(exit_codes::OK)
}

fn load_tasks(source: &CatalogSource) -> Result<Vec<Task>> {
    match (&source.catalog, &source.builtin) {
        (Some(path), _) => load_catalog(path),
        (None, Some(name)) => {
            builtin(name).ok_or_else(|| anyhow!("unknown built-in catalog '{name}'"))
        }
        (None, None) => bail!("either --catalog or --builtin is required"),
    }
}

/// Apply `--only` and `--limit`, keeping catalog order.
fn select_tasks(tasks: Vec<Task>, only: &[String], limit: Option<usize>) -> Result<Vec<Task>> {
    let mut selected = tasks;
    if !only.is_empty() {
        let known: BTreeSet<&str> = selected.iter().map(|task| task.name.as_str()).collect();
        let missing: Vec<&str> = only
            .iter()
            .map(String::as_str)
            .filter(|name| !known.contains(name))
            .collect();
        if !missing.is_empty() {
            bail!("--only names not in catalog: {}", missing.join(", "));
        }
        selected.retain(|task| only.contains(&task.name));
    }
    if let Some(limit) = limit {
        selected.truncate(limit);
    }
    Ok(selected)
}

/// Log warnings; fail on errors.
fn check_catalog(tasks: &[Task], duplicates: DuplicatePolicy) -> Result<()> {
    let issues = validate_catalog(tasks, duplicates);
    let mut errors = Vec::new();
    for issue in issues {
        if issue.is_error() {
            errors.push(issue.to_string());
        } else {
            warn!(%issue, "catalog warning");
        }
    }
    if !errors.is_empty() {
        bail!("catalog invariant violations:\n- {}", errors.join("\n- "));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use branchsmith::core::types::CommitStep;

    #[test]
    fn parse_init_force() {
        let cli = Cli::parse_from(["branchsmith", "init", "--force"]);
        assert!(matches!(cli.command, Command::Init { force: true }));
        assert_eq!(cli.repo, PathBuf::from("."));
    }

    #[test]
    fn parse_run_with_overrides() {
        let cli = Cli::parse_from([
            "branchsmith",
            "--repo",
            "/tmp/r",
            "run",
            "--builtin",
            "workflow",
            "--only",
            "workflow/feature-1",
            "--only",
            "workflow/feature-2",
            "--limit",
            "1",
            "--no-push",
            "--strict",
        ]);
        assert_eq!(cli.repo, PathBuf::from("/tmp/r"));
        let Command::Run {
            source,
            only,
            limit,
            no_push,
            no_review,
            strict,
            ..
        } = cli.command
        else {
            panic!("expected run");
        };
        assert_eq!(source.builtin.as_deref(), Some("workflow"));
        assert_eq!(only.len(), 2);
        assert_eq!(limit, Some(1));
        assert!(no_push && strict && !no_review);
    }

    #[test]
    fn catalog_source_is_exclusive_and_required() {
        assert!(Cli::try_parse_from(["branchsmith", "plan"]).is_err());
        assert!(
            Cli::try_parse_from([
                "branchsmith",
                "plan",
                "--builtin",
                "frontend",
                "--catalog",
                "c.json"
            ])
            .is_err()
        );
        assert!(Cli::try_parse_from(["branchsmith", "plan", "--builtin", "nope"]).is_err());
    }

    #[test]
    fn select_tasks_filters_then_limits() {
        let tasks = vec![
            Task::new("a", "a", "").with_step(CommitStep::new("a")),
            Task::new("b", "b", "").with_step(CommitStep::new("b")),
            Task::new("c", "c", "").with_step(CommitStep::new("c")),
        ];
        let only = vec!["c".to_string(), "a".to_string()];
        let selected = select_tasks(tasks.clone(), &only, Some(1)).expect("select");
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].name, "a");

        let err = select_tasks(tasks, &["zzz".to_string()], None).unwrap_err();
        assert!(err.to_string().contains("zzz"));
    }

    #[test]
    fn check_catalog_rejects_duplicates_only_when_asked() {
        let tasks = vec![
            Task::new("a", "a", "").with_step(CommitStep::new("m")),
            Task::new("a", "a", "").with_step(CommitStep::new("m")),
        ];
        assert!(check_catalog(&tasks, DuplicatePolicy::Warn).is_ok());
        assert!(check_catalog(&tasks, DuplicatePolicy::Reject).is_err());
    }
}
