//! Repository-local state directory (`.branchsmith/`).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use tracing::debug;

use crate::io::catalog_store::{sample_catalog, write_catalog};
use crate::io::config::{BranchsmithConfig, write_config};

/// Ignore everything inside the state dir, including this file, so
/// `git add -A` never stages tool state.
const STATE_GITIGNORE: &str = "*\n";

/// All canonical paths within `.branchsmith/` for a repository root.
#[derive(Debug, Clone)]
pub struct StatePaths {
    pub root: PathBuf,
    pub state_dir: PathBuf,
    pub gitignore_path: PathBuf,
    pub config_path: PathBuf,
    pub catalog_path: PathBuf,
    pub stop_path: PathBuf,
    pub runs_dir: PathBuf,
}

impl StatePaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let state_dir = root.join(".branchsmith");
        Self {
            root: root.clone(),
            state_dir: state_dir.clone(),
            gitignore_path: state_dir.join(".gitignore"),
            config_path: state_dir.join("config.toml"),
            catalog_path: state_dir.join("catalog.json"),
            stop_path: state_dir.join("STOP"),
            runs_dir: state_dir.join("runs"),
        }
    }
}

/// Make sure the state dir exists and is git-ignored.
pub fn ensure_state_dir(paths: &StatePaths) -> Result<()> {
    fs::create_dir_all(&paths.state_dir)
        .with_context(|| format!("create {}", paths.state_dir.display()))?;
    let current = fs::read_to_string(&paths.gitignore_path).unwrap_or_default();
    if current.lines().any(|line| line.trim() == "*") {
        return Ok(());
    }
    debug!(path = %paths.gitignore_path.display(), "writing state .gitignore");
    fs::write(&paths.gitignore_path, STATE_GITIGNORE)
        .with_context(|| format!("write {}", paths.gitignore_path.display()))
}

/// Options for `init_state`.
#[derive(Debug, Clone)]
pub struct InitOptions {
    /// If true, overwrite existing config and sample catalog.
    pub force: bool,
}

/// Create `.branchsmith/` with default config and a sample catalog.
///
/// Fails if the config already exists unless `options.force` is set.
pub fn init_state(root: &Path, options: &InitOptions) -> Result<StatePaths> {
    let paths = StatePaths::new(root);
    if paths.state_dir.exists() && !paths.state_dir.is_dir() {
        return Err(anyhow!(
            "init: {} exists but is not a directory",
            paths.state_dir.display()
        ));
    }
    if paths.config_path.exists() && !options.force {
        return Err(anyhow!(
            "init: {} already exists (use --force to overwrite)",
            paths.config_path.display()
        ));
    }
    ensure_state_dir(&paths)?;
    write_config(&paths.config_path, &BranchsmithConfig::default())?;
    write_catalog(&paths.catalog_path, &sample_catalog())?;
    Ok(paths)
}
