//! Configuration stored under `.branchsmith/config.toml`.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::core::invariants::{check_branch_name, is_contained};
use crate::core::review_body::ReviewBodyRenderer;
use crate::core::types::{DuplicatePolicy, EmptyCommitPolicy, MergeStrategy};
use crate::io::process::ProcessLimits;

/// Run configuration (TOML).
///
/// Missing fields default to the behavior of a plain `git` + `gh` setup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BranchsmithConfig {
    /// Branch every task starts from and merges back into.
    pub trunk: String,

    /// Remote that task branches are pushed to.
    pub remote: String,

    /// Force-push each task branch after its commits.
    pub push: bool,

    /// Open and merge a review for each task.
    pub open_reviews: bool,

    pub merge_strategy: MergeStrategy,

    /// Ask the review service to delete the source branch on merge.
    pub delete_source_branch: bool,

    /// Pull trunk after each task so the next branch sees merged history.
    pub pull_after_merge: bool,

    pub empty_commits: EmptyCommitPolicy,

    pub duplicate_tasks: DuplicatePolicy,

    /// Per child-process wall-clock budget in seconds.
    pub command_timeout_secs: u64,

    /// Truncate captured child-process output beyond this many bytes.
    pub output_limit_bytes: usize,

    /// Minijinja template for review bodies (default lists commits).
    pub review_body_template: Option<String>,

    pub bootstrap: BootstrapConfig,
}

/// Seed commit written when trunk has no history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BootstrapConfig {
    pub file: String,
    pub content: String,
    pub message: String,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            file: "README.md".to_string(),
            content: "# Project\n".to_string(),
            message: "chore: initial commit".to_string(),
        }
    }
}

impl Default for BranchsmithConfig {
    fn default() -> Self {
        Self {
            trunk: "main".to_string(),
            remote: "origin".to_string(),
            push: true,
            open_reviews: true,
            merge_strategy: MergeStrategy::Merge,
            delete_source_branch: true,
            pull_after_merge: true,
            empty_commits: EmptyCommitPolicy::Skip,
            duplicate_tasks: DuplicatePolicy::Warn,
            command_timeout_secs: 300,
            output_limit_bytes: 100_000,
            review_body_template: None,
            bootstrap: BootstrapConfig::default(),
        }
    }
}

impl BranchsmithConfig {
    pub fn validate(&self) -> Result<()> {
        check_branch_name(&self.trunk)
            .map_err(|reason| anyhow!("trunk '{}' is not a valid branch: {reason}", self.trunk))?;
        if self.remote.trim().is_empty() {
            return Err(anyhow!("remote must be non-empty"));
        }
        if self.command_timeout_secs == 0 {
            return Err(anyhow!("command_timeout_secs must be > 0"));
        }
        if self.output_limit_bytes == 0 {
            return Err(anyhow!("output_limit_bytes must be > 0"));
        }
        let seed = Path::new(&self.bootstrap.file);
        if self.bootstrap.file.trim().is_empty() || !is_contained(seed) {
            return Err(anyhow!(
                "bootstrap.file must be a relative path inside the repository"
            ));
        }
        if self.bootstrap.message.trim().is_empty() {
            return Err(anyhow!("bootstrap.message must be non-empty"));
        }
        if let Some(template) = &self.review_body_template {
            ReviewBodyRenderer::new(Some(template.as_str()))?;
        }
        Ok(())
    }

    pub fn process_limits(&self) -> ProcessLimits {
        ProcessLimits {
            timeout: Duration::from_secs(self.command_timeout_secs),
            output_limit_bytes: self.output_limit_bytes,
        }
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `BranchsmithConfig::default()`.
pub fn load_config(path: &Path) -> Result<BranchsmithConfig> {
    if !path.exists() {
        let cfg = BranchsmithConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: BranchsmithConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("validate {}", path.display()))?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &BranchsmithConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("config path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = load_config(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(cfg, BranchsmithConfig::default());
    }

    #[test]
    fn write_then_load_round_trips() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        let cfg = BranchsmithConfig {
            trunk: "develop".to_string(),
            merge_strategy: MergeStrategy::Squash,
            empty_commits: EmptyCommitPolicy::Allow,
            review_body_template: Some("{{ body }}".to_string()),
            ..BranchsmithConfig::default()
        };
        write_config(&path, &cfg).expect("write");
        let loaded = load_config(&path).expect("load");
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        fs::write(
            &path,
            "trunk = \"master\"\nempty_commits = \"allow\"\n\n[bootstrap]\ncontent = \"# Pix-Canvas\\n\"\n",
        )
        .expect("write");
        let cfg = load_config(&path).expect("load");
        assert_eq!(cfg.trunk, "master");
        assert_eq!(cfg.empty_commits, EmptyCommitPolicy::Allow);
        assert_eq!(cfg.bootstrap.content, "# Pix-Canvas\n");
        assert_eq!(cfg.bootstrap.file, "README.md");
        assert!(cfg.push);
    }

    #[test]
    fn rejects_invalid_values() {
        let bad_trunk = BranchsmithConfig {
            trunk: "bad name".to_string(),
            ..BranchsmithConfig::default()
        };
        assert!(bad_trunk.validate().is_err());

        let zero_timeout = BranchsmithConfig {
            command_timeout_secs: 0,
            ..BranchsmithConfig::default()
        };
        assert!(zero_timeout.validate().is_err());

        let mut escaping_seed = BranchsmithConfig::default();
        escaping_seed.bootstrap.file = "../README.md".to_string();
        assert!(escaping_seed.validate().is_err());

        let bad_template = BranchsmithConfig {
            review_body_template: Some("{% if %}".to_string()),
            ..BranchsmithConfig::default()
        };
        assert!(bad_template.validate().is_err());
    }
}
