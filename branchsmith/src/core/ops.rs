//! Declarative transform operations used by catalog files.
//!
//! A catalog cannot carry closures, so file-based tasks describe transforms
//! as a pipeline of operations that are compiled into a [`Transform`].

use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::core::types::Transform;

/// One text operation, applied to the output of the previous one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum TransformOp {
    Append {
        text: String,
    },
    Prepend {
        text: String,
    },
    /// Replace the first occurrence of `from`.
    Replace {
        from: String,
        to: String,
    },
    ReplaceAll {
        from: String,
        to: String,
    },
    RegexReplace {
        pattern: String,
        replacement: String,
        #[serde(default)]
        all: bool,
    },
}

impl TransformOp {
    fn label(&self) -> String {
        match self {
            Self::Append { .. } => "append".to_string(),
            Self::Prepend { .. } => "prepend".to_string(),
            Self::Replace { from, .. } => format!("replace '{from}'"),
            Self::ReplaceAll { from, .. } => format!("replace all '{from}'"),
            Self::RegexReplace { pattern, .. } => format!("regex '{pattern}'"),
        }
    }
}

enum CompiledOp {
    Append(String),
    Prepend(String),
    Replace { from: String, to: String },
    ReplaceAll { from: String, to: String },
    Regex { re: Regex, replacement: String, all: bool },
}

impl CompiledOp {
    fn apply(&self, input: &str) -> String {
        match self {
            Self::Append(text) => format!("{input}{text}"),
            Self::Prepend(text) => format!("{text}{input}"),
            Self::Replace { from, to } => input.replacen(from.as_str(), to, 1),
            Self::ReplaceAll { from, to } => input.replace(from.as_str(), to),
            Self::Regex {
                re,
                replacement,
                all,
            } => {
                if *all {
                    re.replace_all(input, replacement.as_str()).into_owned()
                } else {
                    re.replace(input, replacement.as_str()).into_owned()
                }
            }
        }
    }
}

/// Compile an operation pipeline into a single transform.
///
/// Fails only on invalid regular expressions.
pub fn compile_ops(ops: &[TransformOp]) -> Result<Transform> {
    let mut compiled = Vec::with_capacity(ops.len());
    for op in ops {
        compiled.push(compile_op(op)?);
    }
    let label = if ops.is_empty() {
        "identity".to_string()
    } else {
        ops.iter().map(TransformOp::label).collect::<Vec<_>>().join(" | ")
    };
    Ok(Transform::new(label, move |prior| {
        compiled
            .iter()
            .fold(prior.to_string(), |acc, op| op.apply(&acc))
    }))
}

fn compile_op(op: &TransformOp) -> Result<CompiledOp> {
    Ok(match op {
        TransformOp::Append { text } => CompiledOp::Append(text.clone()),
        TransformOp::Prepend { text } => CompiledOp::Prepend(text.clone()),
        TransformOp::Replace { from, to } => CompiledOp::Replace {
            from: from.clone(),
            to: to.clone(),
        },
        TransformOp::ReplaceAll { from, to } => CompiledOp::ReplaceAll {
            from: from.clone(),
            to: to.clone(),
        },
        TransformOp::RegexReplace {
            pattern,
            replacement,
            all,
        } => CompiledOp::Regex {
            re: Regex::new(pattern).with_context(|| format!("compile regex '{pattern}'"))?,
            replacement: replacement.clone(),
            all: *all,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> String {
        s.to_string()
    }

    #[test]
    fn pipeline_applies_left_to_right() {
        let transform = compile_ops(&[
            TransformOp::Prepend {
                text: text("// header\n"),
            },
            TransformOp::Append { text: text(";") },
        ])
        .expect("compile");
        assert_eq!(transform.apply("let x = 1"), "// header\nlet x = 1;");
        assert_eq!(transform.label(), "prepend | append");
    }

    #[test]
    fn replace_touches_first_occurrence_only() {
        let transform = compile_ops(&[TransformOp::Replace {
            from: text("}"),
            to: text("  return state;\n}"),
        }])
        .expect("compile");
        assert_eq!(
            transform.apply("() => {}\n}"),
            "() => {  return state;\n}\n}"
        );
    }

    #[test]
    fn replace_all_and_regex() {
        let all = compile_ops(&[TransformOp::ReplaceAll {
            from: text("_"),
            to: text(" "),
        }])
        .expect("compile");
        assert_eq!(all.apply("a_b_c"), "a b c");

        let re = compile_ops(&[TransformOp::RegexReplace {
            pattern: text(r"v(\d+)"),
            replacement: text("version $1"),
            all: true,
        }])
        .expect("compile");
        assert_eq!(re.apply("v1 and v2"), "version 1 and version 2");
    }

    #[test]
    fn empty_pipeline_is_identity() {
        let transform = compile_ops(&[]).expect("compile");
        assert_eq!(transform.apply("same"), "same");
        assert_eq!(transform.label(), "identity");
    }

    #[test]
    fn invalid_regex_is_reported() {
        let err = compile_ops(&[TransformOp::RegexReplace {
            pattern: text("("),
            replacement: text(""),
            all: false,
        }])
        .err()
        .expect("invalid regex must fail");
        assert!(err.to_string().contains("compile regex"));
    }

    #[test]
    fn ops_deserialize_from_tagged_json() {
        let ops: Vec<TransformOp> = serde_json::from_str(
            r#"[{"op":"append","text":"y"},{"op":"regex_replace","pattern":"a","replacement":"b"}]"#,
        )
        .expect("parse");
        assert_eq!(
            ops,
            vec![
                TransformOp::Append { text: text("y") },
                TransformOp::RegexReplace {
                    pattern: text("a"),
                    replacement: text("b"),
                    all: false
                }
            ]
        );
    }
}
