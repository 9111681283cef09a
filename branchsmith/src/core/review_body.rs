//! Review body rendering.
//!
//! The default template reproduces the task body followed by a commit list.
//! Config may override it with any minijinja template over the same context.

use anyhow::{Context, Result};
use minijinja::{Environment, context};
use serde::Serialize;

use crate::core::types::Task;

pub const DEFAULT_REVIEW_BODY_TEMPLATE: &str = "\
{{ body }}

## Changes ({{ commits | length }} commits)
{% for message in commits %}- {{ message }}
{% endfor %}";

#[derive(Debug, Clone, Serialize)]
struct StepContext<'a> {
    message: &'a str,
    files: Vec<String>,
}

/// Review body template, syntax-checked at construction.
pub struct ReviewBodyRenderer {
    env: Environment<'static>,
    source: String,
}

impl ReviewBodyRenderer {
    /// Compile `template`, or the default when `None`.
    pub fn new(template: Option<&str>) -> Result<Self> {
        let env = Environment::new();
        let source = template.unwrap_or(DEFAULT_REVIEW_BODY_TEMPLATE).to_string();
        env.template_from_str(&source)
            .context("compile review body template")?;
        Ok(Self { env, source })
    }

    pub fn render(&self, task: &Task, trunk: &str) -> Result<String> {
        let commits: Vec<&str> = task.steps.iter().map(|s| s.message.as_str()).collect();
        let steps: Vec<StepContext<'_>> = task
            .steps
            .iter()
            .map(|step| StepContext {
                message: step.message.as_str(),
                files: step.paths().map(|p| p.display().to_string()).collect(),
            })
            .collect();
        let rendered = self
            .env
            .render_str(
                &self.source,
                context! {
                    name => task.name.as_str(),
                    title => task.title.as_str(),
                    body => task.body.trim(),
                    trunk => trunk,
                    commits => commits,
                    steps => steps,
                },
            )
            .with_context(|| format!("render review body for {}", task.name))?;
        Ok(rendered.trim_end().to_string())
    }
}
