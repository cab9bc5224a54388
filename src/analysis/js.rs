//! Heuristic JavaScript property extraction.
//!
//! This is deliberately not a parser. It recognizes assignments and object
//! entries of the form `path = value` / `path: value` where the left side is
//! a dotted property path and the right side is a string, numeric, or boolean
//! literal. It will miss minified, packed, and exotic code; that trade-off is
//! accepted in exchange for speed and simplicity.

use once_cell::sync::Lazy;
use regex::Regex;

/// Property assignments with a literal right-hand side. Word boundaries apply
/// to the bare literals only; quoted strings end at their closing quote.
static JS_PROPERTY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"([a-zA-Z0-9_$.]+)\s*[:=]\s*(?:'((?:[^'\\]|\\.)*)'|"((?:[^"\\]|\\.)*)"|`((?:[^`\\]|\\.)*)`|([0-9.]+)\b|(true|false)\b)"#,
    )
    .expect("JS property extractor regex is valid")
});

/// Extracts `(property path, literal value)` pairs from a script body.
/// Assignments whose value is empty are skipped.
pub(crate) fn extract_properties(script: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for caps in JS_PROPERTY_RE.captures_iter(script) {
        let Some(path) = caps.get(1) else {
            continue;
        };
        // The first non-empty literal group carries the value.
        let value = (2..=6)
            .filter_map(|i| caps.get(i))
            .map(|m| m.as_str())
            .find(|v| !v.is_empty());
        if let Some(value) = value {
            out.push((path.as_str().to_string(), value.to_string()));
        }
    }
    out
}
