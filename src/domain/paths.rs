//! Hierarchical path helpers.
//!
//! Space paths look like `org/team/project`; repository and registry
//! references append one more identifier segment to a scope path.

use serde::{Deserialize, Serialize};

use crate::domain::errors::{DomainError, DomainResult};

/// Separator between path segments.
pub const SEPARATOR: char = '/';

/// Maximum length of a single identifier segment.
pub const MAX_IDENTIFIER_LENGTH: usize = 100;

/// Split a path into its segments, ignoring leading and trailing separators.
///
/// Interior empty segments (`a//b`) are kept so callers can reject them.
pub fn segments(path: &str) -> Vec<&str> {
    let trimmed = path.trim_matches(SEPARATOR);
    if trimmed.is_empty() {
        return Vec::new();
    }
    trimmed.split(SEPARATOR).collect()
}

/// Validate that a path has at least one segment and no empty segments.
pub fn validate(path: &str) -> DomainResult<()> {
    let parts = segments(path);
    if parts.is_empty() {
        return Err(DomainError::invalid_reference(path, "path is empty"));
    }
    if parts.iter().any(|s| s.trim().is_empty()) {
        return Err(DomainError::invalid_reference(path, "path contains an empty segment"));
    }
    Ok(())
}

/// Split a path into its parent scope and its leaf segment.
///
/// `acme/team1/app` becomes `("acme/team1", "app")`. A single-segment path
/// has no scope and is an invalid reference for scoped entities.
pub fn dissect_leaf(path: &str) -> DomainResult<(String, String)> {
    validate(path)?;
    let parts = segments(path);
    match parts.split_last() {
        Some((leaf, parent)) if !parent.is_empty() => {
            Ok((parent.join(&SEPARATOR.to_string()), (*leaf).to_string()))
        }
        _ => Err(DomainError::invalid_reference(
            path,
            "path must contain a scope and a leaf identifier",
        )),
    }
}

/// Split a path into its root segment and the (possibly empty) remainder.
pub fn dissect_root(path: &str) -> DomainResult<(String, Option<String>)> {
    validate(path)?;
    let parts = segments(path);
    match parts.split_first() {
        Some((root, [])) => Ok(((*root).to_string(), None)),
        Some((root, rest)) => Ok(((*root).to_string(), Some(rest.join(&SEPARATOR.to_string())))),
        None => Err(DomainError::invalid_reference(path, "path is empty")),
    }
}

/// Join a parent path and a child identifier.
pub fn concat(parent: &str, leaf: &str) -> String {
    let parent = parent.trim_matches(SEPARATOR);
    let leaf = leaf.trim_matches(SEPARATOR);
    match (parent.is_empty(), leaf.is_empty()) {
        (true, _) => leaf.to_string(),
        (_, true) => parent.to_string(),
        _ => format!("{parent}{SEPARATOR}{leaf}"),
    }
}

/// Returns true if the path has exactly one segment.
pub fn is_root(path: &str) -> bool {
    segments(path).len() == 1
}

/// Parse a reference as a numeric ID. Only strictly positive integers count.
pub fn parse_id(reference: &str) -> Option<i64> {
    reference.parse::<i64>().ok().filter(|id| *id > 0)
}

/// Validate a single identifier segment (space, repository or registry name).
pub fn validate_identifier(identifier: &str) -> DomainResult<()> {
    if identifier.is_empty() {
        return Err(DomainError::invalid_reference(identifier, "identifier is empty"));
    }
    if identifier.len() > MAX_IDENTIFIER_LENGTH {
        return Err(DomainError::invalid_reference(
            identifier,
            format!("identifier is longer than {MAX_IDENTIFIER_LENGTH} characters"),
        ));
    }
    if !identifier
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    {
        return Err(DomainError::invalid_reference(
            identifier,
            "identifier may only contain alphanumerics, '-', '_' and '.'",
        ));
    }
    if identifier.chars().all(|c| c.is_ascii_digit()) {
        return Err(DomainError::invalid_reference(
            identifier,
            "identifier cannot be purely numeric",
        ));
    }
    Ok(())
}

/// How space path segments are canonicalized before they are used as keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathTransformation {
    /// Every segment is folded to lower case.
    #[default]
    CaseInsensitive,
    /// The root segment keeps its case, descendants are folded.
    CaseSensitiveRoot,
}

impl PathTransformation {
    /// Normalize one segment.
    pub fn segment(self, segment: &str, is_root: bool) -> String {
        match (self, is_root) {
            (Self::CaseSensitiveRoot, true) => segment.to_string(),
            _ => segment.to_lowercase(),
        }
    }

    /// Normalize a complete path.
    pub fn apply(self, path: &str) -> String {
        normalize(path, |segment, is_root| self.segment(segment, is_root))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::CaseInsensitive => "case_insensitive",
            Self::CaseSensitiveRoot => "case_sensitive_root",
        }
    }
}

/// Normalize every segment of `path` with `transform` and rejoin them.
///
/// Empty boundary segments are dropped; the first remaining segment is
/// passed to `transform` with `is_root = true`.
pub fn normalize<F>(path: &str, transform: F) -> String
where
    F: Fn(&str, bool) -> String,
{
    segments(path)
        .iter()
        .enumerate()
        .map(|(i, segment)| transform(segment, i == 0))
        .collect::<Vec<_>>()
        .join(&SEPARATOR.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_segments_trims_boundaries() {
        assert_eq!(segments("/acme/team1/"), vec!["acme", "team1"]);
        assert!(segments("///").is_empty());
        assert_eq!(segments("a//b"), vec!["a", "", "b"]);
    }

    #[test]
    fn test_dissect_leaf() {
        let (parent, leaf) = dissect_leaf("acme/team1/app").unwrap();
        assert_eq!(parent, "acme/team1");
        assert_eq!(leaf, "app");

        let (parent, leaf) = dissect_leaf("/acme/app/").unwrap();
        assert_eq!(parent, "acme");
        assert_eq!(leaf, "app");
    }

    #[test]
    fn test_dissect_leaf_requires_scope() {
        let err = dissect_leaf("app").unwrap_err();
        assert!(matches!(err, DomainError::InvalidReference { .. }));

        assert!(dissect_leaf("").is_err());
        assert!(dissect_leaf("acme//app").is_err());
    }

    #[test]
    fn test_dissect_root() {
        assert_eq!(dissect_root("acme").unwrap(), ("acme".to_string(), None));
        assert_eq!(
            dissect_root("acme/team1/app").unwrap(),
            ("acme".to_string(), Some("team1/app".to_string()))
        );
    }

    #[test]
    fn test_concat() {
        assert_eq!(concat("acme/team1", "app"), "acme/team1/app");
        assert_eq!(concat("", "acme"), "acme");
        assert_eq!(concat("/acme/", "/app"), "acme/app");
    }

    #[test]
    fn test_parse_id_only_accepts_positive() {
        assert_eq!(parse_id("42"), Some(42));
        assert_eq!(parse_id("0"), None);
        assert_eq!(parse_id("-3"), None);
        assert_eq!(parse_id("acme"), None);
        assert_eq!(parse_id("42/app"), None);
    }

    #[test]
    fn test_validate_identifier() {
        assert!(validate_identifier("team-1_a.b").is_ok());
        assert!(validate_identifier("").is_err());
        assert!(validate_identifier("has space").is_err());
        assert!(validate_identifier("12345").is_err());
        assert!(validate_identifier(&"x".repeat(MAX_IDENTIFIER_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_transformations() {
        assert_eq!(PathTransformation::CaseInsensitive.apply("Org/Team/Repo"), "org/team/repo");
        assert_eq!(
            PathTransformation::CaseSensitiveRoot.apply("/Org/Team/Repo/"),
            "Org/team/repo"
        );
    }

    proptest! {
        #[test]
        fn prop_normalize_is_idempotent(path in "[A-Za-z0-9/]{0,40}") {
            for t in [PathTransformation::CaseInsensitive, PathTransformation::CaseSensitiveRoot] {
                let once = t.apply(&path);
                prop_assert_eq!(t.apply(&once), once);
            }
        }

        #[test]
        fn prop_case_variants_of_descendants_collapse(root in "[A-Z][a-z]{1,8}", leaf in "[a-z]{1,8}") {
            let t = PathTransformation::CaseSensitiveRoot;
            let lower = format!("{root}/{leaf}");
            let upper = format!("{root}/{}", leaf.to_uppercase());
            prop_assert_eq!(t.apply(&lower), t.apply(&upper));
        }
    }
}
