//! The strict fingerprint schema.
//!
//! These structs define the on-disk format shared by the offline pipeline
//! (which writes it) and the runtime engine (which reads it). All maps are
//! `BTreeMap` so serialization is key-sorted and deterministic; empty fields
//! are omitted.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A single pre-validated pattern: the cleaned regex plus any DSL directives
/// (`version`, `confidence`) that followed it in the upstream pattern string.
///
/// An empty `regex` is the always-matches sentinel: the pattern matches any
/// input without producing submatches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedPattern {
    /// The cleaned regular expression (or CSS selector for the `dom` vector)
    pub regex: String,
    /// DSL directives keyed by name, e.g. `version` → `\1`
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub commands: BTreeMap<String, String>,
}

impl ParsedPattern {
    /// Builds a pattern with no directives.
    pub fn new(regex: impl Into<String>) -> Self {
        Self {
            regex: regex.into(),
            commands: BTreeMap::new(),
        }
    }
}

/// One technology's fingerprint: patterns grouped by vector, plus
/// implications and descriptive metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Fingerprint {
    /// Patterns matched against inline `<style>` blocks
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub css: Vec<ParsedPattern>,
    /// Cookie name (lower-cased) → pattern matched against the cookie value
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub cookies: BTreeMap<String, ParsedPattern>,
    /// JavaScript property path → pattern matched against the assigned value
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub js: BTreeMap<String, ParsedPattern>,
    /// Header name (lower-cased) → pattern matched against header values
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, ParsedPattern>,
    /// Patterns matched against visible body text
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub html: Vec<ParsedPattern>,
    /// Patterns matched against inline script content
    #[serde(rename = "scripts", default, skip_serializing_if = "Vec::is_empty")]
    pub script: Vec<ParsedPattern>,
    /// Patterns matched against `<script src>` values
    #[serde(rename = "scriptSrc", default, skip_serializing_if = "Vec::is_empty")]
    pub script_src: Vec<ParsedPattern>,
    /// Meta name (lower-cased) → patterns matched against content values
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub meta: BTreeMap<String, Vec<ParsedPattern>>,
    /// Patterns matched against the target URL
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub url: Vec<ParsedPattern>,
    /// Patterns matched against robots.txt content
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub robots: Vec<ParsedPattern>,
    /// CSS selectors tested for existence against the parsed document
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dom: Vec<ParsedPattern>,
    /// DNS record type (upper-cased: TXT, MX, NS, SOA, CNAME) → pattern
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub dns: BTreeMap<String, ParsedPattern>,
    /// Certificate issuer field name → pattern matched against the cached issuer
    #[serde(rename = "certIssuer", default, skip_serializing_if = "BTreeMap::is_empty")]
    pub cert_issuer: BTreeMap<String, ParsedPattern>,

    /// Technologies presumed present when this one is detected with high confidence
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub implies: Vec<String>,
    /// Category IDs (need not all exist in the category table)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cats: Vec<i64>,
    /// Human-readable description
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Technology website URL
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub website: String,
    /// Icon file reference
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub icon: String,
    /// CPE identifier
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cpe: String,
}

/// The fingerprint database: technology name → fingerprint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Fingerprints {
    /// Technologies keyed by name
    pub apps: BTreeMap<String, Fingerprint>,
}

/// One entry of the category table.
///
/// The upstream serializes `priority` as a number; the database stores it as
/// a string for schema stability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    /// Human-readable category name
    pub name: String,
    /// Ordering hint, stored as a string
    #[serde(default, deserialize_with = "deserialize_priority")]
    pub priority: String,
}

/// Deserializes a priority that may be a JSON number or a string.
fn deserialize_priority<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Visitor};
    use std::fmt;

    struct PriorityVisitor;

    impl<'de> Visitor<'de> for PriorityVisitor {
        type Value = String;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or a number")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(value.to_string())
        }
    }

    deserializer.deserialize_any(PriorityVisitor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_deserialize_defaults() {
        let fp: Fingerprint = serde_json::from_str("{}").expect("Failed to deserialize");
        assert!(fp.css.is_empty());
        assert!(fp.headers.is_empty());
        assert!(fp.meta.is_empty());
        assert!(fp.implies.is_empty());
        assert!(fp.cats.is_empty());
        assert!(fp.website.is_empty());
    }

    #[test]
    fn test_fingerprint_field_renames() {
        let json = r#"{
            "scripts": [{"regex": "inline-marker"}],
            "scriptSrc": [{"regex": "cdn\\.example\\.com"}],
            "certIssuer": {"commonName": {"regex": "some ca"}}
        }"#;
        let fp: Fingerprint = serde_json::from_str(json).expect("Failed to deserialize");
        assert_eq!(fp.script.len(), 1);
        assert_eq!(fp.script_src.len(), 1);
        assert_eq!(fp.cert_issuer.len(), 1);
    }

    #[test]
    fn test_parsed_pattern_commands_roundtrip() {
        let json = r#"{"regex": "nginx/([\\d.]+)", "commands": {"version": "\\1"}}"#;
        let pat: ParsedPattern = serde_json::from_str(json).expect("Failed to deserialize");
        assert_eq!(pat.commands.get("version"), Some(&"\\1".to_string()));

        let out = serde_json::to_string(&pat).expect("Failed to serialize");
        let back: ParsedPattern = serde_json::from_str(&out).expect("Failed to deserialize");
        assert_eq!(pat, back);
    }

    #[test]
    fn test_parsed_pattern_empty_commands_omitted() {
        let pat = ParsedPattern::new("wp-content");
        let out = serde_json::to_string(&pat).expect("Failed to serialize");
        assert!(!out.contains("commands"));
    }

    #[test]
    fn test_empty_fields_omitted_in_output() {
        let fp = Fingerprint {
            html: vec![ParsedPattern::new("powered by example")],
            ..Default::default()
        };
        let out = serde_json::to_string(&fp).expect("Failed to serialize");
        assert!(out.contains("html"));
        assert!(!out.contains("cookies"));
        assert!(!out.contains("scriptSrc"));
    }

    #[test]
    fn test_category_priority_number_or_string() {
        let from_number: Category =
            serde_json::from_str(r#"{"name": "CMS", "priority": 9}"#).expect("deserialize");
        assert_eq!(from_number.priority, "9");

        let from_string: Category =
            serde_json::from_str(r#"{"name": "CMS", "priority": "9"}"#).expect("deserialize");
        assert_eq!(from_string.priority, "9");
    }

    #[test]
    fn test_fingerprints_sorted_output() {
        let mut fps = Fingerprints::default();
        fps.apps.insert("Zulu".into(), Fingerprint::default());
        fps.apps.insert("Alpha".into(), Fingerprint::default());
        let out = serde_json::to_string(&fps).expect("Failed to serialize");
        let alpha = out.find("Alpha").expect("Alpha present");
        let zulu = out.find("Zulu").expect("Zulu present");
        assert!(alpha < zulu, "keys should serialize in sorted order");
    }
}
