//! Catalog file load/save with schema validation.
//!
//! Catalog files are JSON (`{"version": 1, "tasks": [...]}`). Changes carry
//! either a `literal` string or a `transform` pipeline of [`TransformOp`]s,
//! which are compiled into [`Transform`](crate::core::types::Transform)s on load.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use jsonschema::validator_for;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::core::ops::{TransformOp, compile_ops};
use crate::core::types::{CommitStep, ContentSpec, FileChange, Task};

pub const CATALOG_SCHEMA: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../schemas/catalog/v1.schema.json"
));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogFile {
    pub version: u32,
    pub tasks: Vec<TaskEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskEntry {
    pub name: String,
    pub title: String,
    #[serde(default)]
    pub body: String,
    pub steps: Vec<StepEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepEntry {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub changes: Vec<ChangeEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEntry {
    pub path: String,
    #[serde(flatten)]
    pub content: ChangeContent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeContent {
    Literal(String),
    Transform(Vec<TransformOp>),
}

impl CatalogFile {
    /// Compile entries into tasks, preserving catalog and change order.
    pub fn into_tasks(self) -> Result<Vec<Task>> {
        self.tasks.into_iter().map(compile_task).collect()
    }
}

fn compile_task(entry: TaskEntry) -> Result<Task> {
    let mut steps = Vec::with_capacity(entry.steps.len());
    for (index, step) in entry.steps.into_iter().enumerate() {
        let mut changes = Vec::with_capacity(step.changes.len());
        for change in step.changes {
            let spec = match change.content {
                ChangeContent::Literal(text) => ContentSpec::Literal(text),
                ChangeContent::Transform(ops) => {
                    ContentSpec::Transform(compile_ops(&ops).with_context(|| {
                        format!(
                            "task '{}' step {} change '{}'",
                            entry.name,
                            index + 1,
                            change.path
                        )
                    })?)
                }
            };
            changes.push(FileChange {
                path: PathBuf::from(change.path),
                spec,
            });
        }
        steps.push(CommitStep {
            message: step.message,
            target_directory: step.directory.map(PathBuf::from),
            changes,
        });
    }
    Ok(Task {
        name: entry.name,
        title: entry.title,
        body: entry.body,
        steps,
    })
}

/// Parse and validate catalog JSON: schema conformance, then compile.
pub fn parse_catalog(raw: &str) -> Result<Vec<Task>> {
    let value: Value = serde_json::from_str(raw).context("parse catalog json")?;
    validate_schema(&value)?;
    let file: CatalogFile =
        serde_json::from_value(value).context("deserialize catalog as v1 struct")?;
    file.into_tasks()
}

/// Load catalog from disk.
pub fn load_catalog(path: &Path) -> Result<Vec<Task>> {
    debug!(path = %path.display(), "loading catalog");
    let raw =
        fs::read_to_string(path).with_context(|| format!("read catalog {}", path.display()))?;
    parse_catalog(&raw).with_context(|| format!("load catalog {}", path.display()))
}

/// Write catalog JSON with a trailing newline.
pub fn write_catalog(path: &Path, catalog: &CatalogFile) -> Result<()> {
    let mut buf = serde_json::to_string_pretty(catalog).context("serialize catalog")?;
    buf.push('\n');
    fs::write(path, buf).with_context(|| format!("write catalog {}", path.display()))
}

fn validate_schema(catalog: &Value) -> Result<()> {
    let schema_value: Value =
        serde_json::from_str(CATALOG_SCHEMA).context("parse embedded catalog schema")?;
    let compiled =
        validator_for(&schema_value).map_err(|err| anyhow!("invalid schema: {}", err))?;
    if !compiled.is_valid(catalog) {
        let messages = compiled
            .iter_errors(catalog)
            .map(|err| err.to_string())
            .collect::<Vec<_>>();
        return Err(anyhow!(
            "catalog schema validation failed: {}",
            messages.join("; ")
        ));
    }
    Ok(())
}

/// Small catalog written by `init`: one task exercising literal, transform,
/// and directory-only steps.
pub fn sample_catalog() -> CatalogFile {
    CatalogFile {
        version: 1,
        tasks: vec![TaskEntry {
            name: "demo".to_string(),
            title: "feat: add demo files".to_string(),
            body: "Demo task generated by `branchsmith init`.".to_string(),
            steps: vec![
                StepEntry {
                    message: "feat: add a.txt".to_string(),
                    directory: None,
                    changes: vec![ChangeEntry {
                        path: "a.txt".to_string(),
                        content: ChangeContent::Literal("hello".to_string()),
                    }],
                },
                StepEntry {
                    message: "feat: extend a.txt".to_string(),
                    directory: None,
                    changes: vec![ChangeEntry {
                        path: "a.txt".to_string(),
                        content: ChangeContent::Transform(vec![TransformOp::Append {
                            text: "\nworld".to_string(),
                        }]),
                    }],
                },
                StepEntry {
                    message: "chore: scaffold docs directory".to_string(),
                    directory: Some("docs".to_string()),
                    changes: Vec::new(),
                },
            ],
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::content::compute_content;

    #[test]
    fn sample_catalog_round_trips_through_disk() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("catalog.json");
        write_catalog(&path, &sample_catalog()).expect("write");
        let tasks = load_catalog(&path).expect("load");
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].name, "demo");
        assert_eq!(tasks[0].steps.len(), 3);
        assert_eq!(
            tasks[0].steps[2].target_directory.as_deref(),
            Some(Path::new("docs"))
        );
    }

    #[test]
    fn transforms_are_compiled_in_order() {
        let raw = r##"{
            "version": 1,
            "tasks": [{
                "name": "docs/roadmap",
                "title": "docs: add Roadmap",
                "steps": [{
                    "message": "docs: create Roadmap.md",
                    "changes": [
                        {"path": "docs/Roadmap.md", "literal": "# Roadmap\n"},
                        {"path": "docs/Roadmap.md", "transform": [
                            {"op": "append", "text": "\n## Introduction"},
                            {"op": "replace", "from": "# Roadmap", "to": "# Product Roadmap"}
                        ]}
                    ]
                }]
            }]
        }"##;
        let tasks = parse_catalog(raw).expect("parse");
        let step = &tasks[0].steps[0];
        assert_eq!(step.changes.len(), 2);
        let first = compute_content(&step.changes[0].spec, None);
        let second = compute_content(&step.changes[1].spec, Some(&first));
        assert_eq!(second, "# Product Roadmap\n\n## Introduction");
        assert_eq!(tasks[0].body, "");
    }

    #[test]
    fn schema_rejects_change_with_both_contents() {
        let raw = r#"{"version": 1, "tasks": [{"name": "x", "title": "t", "steps": [
            {"message": "m", "changes": [{"path": "a", "literal": "x", "transform": []}]}
        ]}]}"#;
        let err = parse_catalog(raw).unwrap_err();
        assert!(err.to_string().contains("schema validation failed"));
    }

    #[test]
    fn schema_rejects_unknown_op_and_version() {
        let bad_op = r#"{"version": 1, "tasks": [{"name": "x", "title": "t", "steps": [
            {"message": "m", "changes": [{"path": "a", "transform": [{"op": "delete"}]}]}
        ]}]}"#;
        assert!(parse_catalog(bad_op).is_err());
        assert!(parse_catalog(r#"{"version": 2, "tasks": []}"#).is_err());
    }

    #[test]
    fn invalid_regex_names_the_change() {
        let raw = r#"{"version": 1, "tasks": [{"name": "x", "title": "t", "steps": [
            {"message": "m", "changes": [{"path": "a.ts", "transform": [
                {"op": "regex_replace", "pattern": "(", "replacement": ""}
            ]}]}
        ]}]}"#;
        let err = parse_catalog(raw).unwrap_err();
        assert!(format!("{err:#}").contains("change 'a.ts'"));
    }
}
