//! Compiled pattern matcher.
//!
//! Reads the validated database and produces a context-indexed structure
//! that lets the runtime find applicable patterns per vector — and, where
//! applicable, per header/cookie/meta/DNS name — without scanning every
//! technology. The matcher is built once at engine construction and shared
//! read-only afterwards.

pub(crate) mod version;
pub(crate) mod watchdog;

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use log::warn;
use regex::{Regex, RegexBuilder};
use scraper::Selector;

use crate::pipeline::types::ParsedPattern;
use crate::ruleset::FingerprintRuleset;

use watchdog::match_with_timeout;

/// One compiled pattern, associated with its owning application.
#[derive(Debug, Clone)]
pub(crate) struct PatternInfo {
    /// Compiled case-insensitive regex; `None` is the always-matches sentinel
    /// for an empty pattern string.
    regex: Option<Regex>,
    /// The original pattern text, kept for the audit trail.
    pub source: String,
    /// Owning technology name.
    pub app: String,
    /// DSL directives (`version`, `confidence`).
    pub commands: BTreeMap<String, String>,
}

impl PatternInfo {
    fn compile(pat: &ParsedPattern, app: &str) -> Option<Self> {
        let regex = if pat.regex.is_empty() {
            None
        } else {
            match RegexBuilder::new(&pat.regex).case_insensitive(true).build() {
                Ok(re) => Some(re),
                Err(e) => {
                    warn!("dropping pattern `{}` for app {app}: {e}", pat.regex);
                    return None;
                }
            }
        };
        Some(Self {
            regex,
            source: pat.regex.clone(),
            app: app.to_string(),
            commands: pat.commands.clone(),
        })
    }

    /// Runs this pattern against `input` under the watchdog. Returns the
    /// capture list on a match (index 0 is the full match).
    pub(crate) fn run(&self, input: &str, timeout: Duration) -> Option<Vec<Option<String>>> {
        match &self.regex {
            Some(re) => match_with_timeout(re, input, timeout),
            // Sentinel: matches any input with an empty full match.
            None => Some(vec![Some(String::new())]),
        }
    }
}

/// One DOM pattern: a pre-parsed CSS selector tested for existence.
#[derive(Debug, Clone)]
pub(crate) struct DomPatternInfo {
    pub selector: Selector,
    /// The selector text, kept for the audit trail.
    pub source: String,
    pub app: String,
}

/// The context-indexed matcher.
#[derive(Debug, Default)]
pub(crate) struct CompiledMatcher {
    pub html: Vec<PatternInfo>,
    pub script_src: Vec<PatternInfo>,
    pub script: Vec<PatternInfo>,
    pub css: Vec<PatternInfo>,
    pub url: Vec<PatternInfo>,
    pub robots: Vec<PatternInfo>,
    pub dom: Vec<DomPatternInfo>,
    /// Keyed by lower-cased header name
    pub headers: HashMap<String, Vec<PatternInfo>>,
    /// Keyed by lower-cased cookie name
    pub cookies: HashMap<String, Vec<PatternInfo>>,
    /// Keyed by lower-cased meta name
    pub meta: HashMap<String, Vec<PatternInfo>>,
    /// Keyed by the exact JavaScript property path
    pub js: HashMap<String, Vec<PatternInfo>>,
    /// Keyed by upper-cased DNS record type
    pub dns: HashMap<String, Vec<PatternInfo>>,
    /// Keyed by issuer field name
    pub cert_issuer: HashMap<String, Vec<PatternInfo>>,
}

impl CompiledMatcher {
    /// Compiles the full ruleset. Individual pattern failures are logged and
    /// dropped; the build always succeeds.
    pub(crate) fn build(ruleset: &FingerprintRuleset) -> Self {
        let mut matcher = Self::default();

        for (app, fp) in &ruleset.apps {
            compile_into(&mut matcher.html, &fp.html, app);
            compile_into(&mut matcher.script_src, &fp.script_src, app);
            compile_into(&mut matcher.script, &fp.script, app);
            compile_into(&mut matcher.css, &fp.css, app);
            compile_into(&mut matcher.url, &fp.url, app);
            compile_into(&mut matcher.robots, &fp.robots, app);

            compile_map_into(&mut matcher.headers, &fp.headers, app, true);
            compile_map_into(&mut matcher.cookies, &fp.cookies, app, true);
            compile_map_into(&mut matcher.js, &fp.js, app, false);
            compile_map_into(&mut matcher.dns, &fp.dns, app, false);
            compile_map_into(&mut matcher.cert_issuer, &fp.cert_issuer, app, false);

            for (name, patterns) in &fp.meta {
                let entry = matcher.meta.entry(name.to_lowercase()).or_default();
                for pat in patterns {
                    if let Some(pi) = PatternInfo::compile(pat, app) {
                        entry.push(pi);
                    }
                }
            }

            for pat in &fp.dom {
                match Selector::parse(&pat.regex) {
                    Ok(selector) => matcher.dom.push(DomPatternInfo {
                        selector,
                        source: pat.regex.clone(),
                        app: app.clone(),
                    }),
                    Err(e) => {
                        warn!("dropping DOM selector `{}` for app {app}: {e}", pat.regex);
                    }
                }
            }
        }

        matcher
    }
}

fn compile_into(target: &mut Vec<PatternInfo>, patterns: &[ParsedPattern], app: &str) {
    for pat in patterns {
        if let Some(pi) = PatternInfo::compile(pat, app) {
            target.push(pi);
        }
    }
}

fn compile_map_into(
    target: &mut HashMap<String, Vec<PatternInfo>>,
    patterns: &BTreeMap<String, ParsedPattern>,
    app: &str,
    lowercase_keys: bool,
) {
    for (name, pat) in patterns {
        if let Some(pi) = PatternInfo::compile(pat, app) {
            let key = if lowercase_keys {
                name.to_lowercase()
            } else {
                name.clone()
            };
            target.entry(key).or_default().push(pi);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ruleset(json: &str) -> FingerprintRuleset {
        FingerprintRuleset::from_json(json, "{}").expect("test ruleset loads")
    }

    #[test]
    fn test_build_indexes_by_vector_and_name() {
        let matcher = CompiledMatcher::build(&ruleset(
            r#"{"apps": {
                "TestTech": {
                    "html": [{"regex": "powered by testtech"}],
                    "headers": {"Server": {"regex": "testtech"}},
                    "meta": {"generator": [{"regex": "^testtech"}]},
                    "dns": {"TXT": {"regex": "testtech-verify"}},
                    "dom": [{"regex": "div.testtech-root"}]
                }
            }}"#,
        ));
        assert_eq!(matcher.html.len(), 1);
        assert!(matcher.headers.contains_key("server"));
        assert!(matcher.meta.contains_key("generator"));
        assert!(matcher.dns.contains_key("TXT"));
        assert_eq!(matcher.dom.len(), 1);
    }

    #[test]
    fn test_build_drops_bad_patterns_and_continues() {
        let matcher = CompiledMatcher::build(&ruleset(
            r#"{"apps": {
                "Broken": {"html": [{"regex": "broken(pattern"}, {"regex": "still-good"}]},
                "BadDom": {"dom": [{"regex": "div[unterminated"}]}
            }}"#,
        ));
        assert_eq!(matcher.html.len(), 1);
        assert_eq!(matcher.html[0].source, "still-good");
        assert!(matcher.dom.is_empty());
    }

    #[test]
    fn test_patterns_compile_case_insensitive() {
        let matcher = CompiledMatcher::build(&ruleset(
            r#"{"apps": {"TestTech": {"html": [{"regex": "PoweredBy-TestTech"}]}}}"#,
        ));
        let caps = matcher.html[0]
            .run("POWEREDBY-TESTTECH", Duration::from_millis(100))
            .expect("case-insensitive match");
        assert_eq!(caps[0].as_deref(), Some("POWEREDBY-TESTTECH"));
    }

    #[test]
    fn test_empty_pattern_is_always_match_sentinel() {
        let matcher = CompiledMatcher::build(&ruleset(
            r#"{"apps": {"PHP": {"cookies": {"phpsessid": {"regex": ""}}}}}"#,
        ));
        let patterns = matcher.cookies.get("phpsessid").expect("sentinel compiled");
        let caps = patterns[0]
            .run("any-value-at-all", Duration::from_millis(100))
            .expect("sentinel always matches");
        assert_eq!(caps.len(), 1);
    }
}
