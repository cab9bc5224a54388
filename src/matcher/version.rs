//! Version template evaluation.
//!
//! A pattern's `version` directive is a template containing `\1`..`\9`
//! submatch references and optionally one ternary of the form
//! `<cond>?<a>:<b>`: if any submatch was captured the first branch is
//! selected, otherwise the second.

use std::collections::BTreeMap;

/// Evaluates a pattern's version template against the capture list of a
/// successful match (index 0 is the full match and is never substituted).
///
/// Patterns lacking a version template yield the empty string.
pub(crate) fn extract_version(
    commands: &BTreeMap<String, String>,
    submatches: &[Option<String>],
) -> String {
    let Some(template) = commands.get("version") else {
        return String::new();
    };
    if template.is_empty() {
        return String::new();
    }

    let has_submatch = submatches.iter().skip(1).any(Option::is_some);

    // Resolve the ternary before substitution so captured text containing
    // '?' or ':' cannot change the branch structure.
    let chosen: &str = match template.split_once('?') {
        Some((_cond, branches)) => {
            let (a, b) = branches.split_once(':').unwrap_or((branches, ""));
            if has_submatch {
                a
            } else {
                b
            }
        }
        None => template,
    };

    let mut out = chosen.to_string();
    for i in (1..=9usize).rev() {
        let needle = format!("\\{i}");
        if out.contains(&needle) {
            let replacement = submatches
                .get(i)
                .and_then(|s| s.as_deref())
                .unwrap_or_default();
            out = out.replace(&needle, replacement);
        }
    }
    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commands(version: &str) -> BTreeMap<String, String> {
        [("version".to_string(), version.to_string())]
            .into_iter()
            .collect()
    }

    fn caps(groups: &[Option<&str>]) -> Vec<Option<String>> {
        groups.iter().map(|g| g.map(str::to_string)).collect()
    }

    #[test]
    fn test_simple_submatch_reference() {
        let version = extract_version(
            &commands("\\1"),
            &caps(&[Some("ver=5.8.1"), Some("5.8.1")]),
        );
        assert_eq!(version, "5.8.1");
    }

    #[test]
    fn test_no_template_yields_empty() {
        let version = extract_version(&BTreeMap::new(), &caps(&[Some("anything")]));
        assert_eq!(version, "");
    }

    #[test]
    fn test_unmatched_group_substitutes_empty() {
        let version = extract_version(&commands("\\1"), &caps(&[Some("nginx"), None]));
        assert_eq!(version, "");
    }

    #[test]
    fn test_missing_ordinal_substitutes_empty() {
        let version = extract_version(&commands("\\3"), &caps(&[Some("x"), Some("1")]));
        assert_eq!(version, "");
    }

    #[test]
    fn test_literal_template_passes_through() {
        let version = extract_version(&commands("ga4"), &caps(&[Some("gtag(")]));
        assert_eq!(version, "ga4");
    }

    #[test]
    fn test_multiple_references() {
        let version = extract_version(
            &commands("\\1.\\2"),
            &caps(&[Some("v4 r2"), Some("4"), Some("2")]),
        );
        assert_eq!(version, "4.2");
    }

    #[test]
    fn test_ternary_with_submatch_selects_first_branch() {
        // "\1?\1:legacy" — a captured group selects the first branch.
        let version = extract_version(
            &commands("\\1?\\1:legacy"),
            &caps(&[Some("build 2.4"), Some("2.4")]),
        );
        assert_eq!(version, "2.4");
    }

    #[test]
    fn test_ternary_without_submatch_selects_second_branch() {
        let version = extract_version(&commands("\\1?\\1:legacy"), &caps(&[Some("build"), None]));
        assert_eq!(version, "legacy");
    }

    #[test]
    fn test_ternary_empty_condition() {
        // "?modern:" — empty condition, empty second branch.
        let with = extract_version(&commands("?modern:"), &caps(&[Some("x"), Some("y")]));
        assert_eq!(with, "modern");
        let without = extract_version(&commands("?modern:"), &caps(&[Some("x"), None]));
        assert_eq!(without, "");
    }

    #[test]
    fn test_whitespace_trimmed() {
        let version = extract_version(&commands("\\1"), &caps(&[Some(" 1.2 "), Some(" 1.2 ")]));
        assert_eq!(version, "1.2");
    }
}
