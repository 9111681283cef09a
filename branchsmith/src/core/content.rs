//! Content computation for a single file change.

use crate::core::types::ContentSpec;

/// Compute the new content for a file given its current content.
///
/// `prior` is `None` when the file does not exist; transforms then see "".
pub fn compute_content(spec: &ContentSpec, prior: Option<&str>) -> String {
    match spec {
        ContentSpec::Literal(text) => text.clone(),
        ContentSpec::Transform(transform) => transform.apply(prior.unwrap_or_default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_ignores_prior_content() {
        let spec = ContentSpec::literal("hello");
        assert_eq!(compute_content(&spec, Some("old")), "hello");
        assert_eq!(compute_content(&spec, None), "hello");
    }

    #[test]
    fn literal_is_idempotent() {
        let spec = ContentSpec::literal("hello");
        let once = compute_content(&spec, None);
        let twice = compute_content(&spec, Some(&once));
        assert_eq!(once, twice);
    }

    #[test]
    fn transform_treats_missing_file_as_empty() {
        let spec = ContentSpec::transform("wrap", |cur| format!("[{cur}]"));
        assert_eq!(compute_content(&spec, None), compute_content(&spec, Some("")));
        assert_eq!(compute_content(&spec, None), "[]");
    }

    #[test]
    fn transform_sees_prior_content() {
        let spec = ContentSpec::transform("append y", |cur| format!("{cur}y"));
        assert_eq!(compute_content(&spec, Some("x")), "xy");
    }
}
