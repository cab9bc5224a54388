//! Schema normalization and regex sanitization.
//!
//! The upstream technology files are loosely typed: a given field may be
//! absent, a string, an array of strings, or an object. This module coerces
//! every field into the strict schema, parses the pattern DSL, rewrites each
//! regex through an AST pass so the runtime engine is guaranteed to accept
//! it, and rejects low-signal patterns outright.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use regex_syntax::hir::{Hir, HirKind, Repetition};
use serde_json::{Map, Value};

use crate::error_handling::PipelineError;
use crate::pipeline::types::{Category, Fingerprint, Fingerprints, ParsedPattern};

/// Low-signal tokens rejected as whole patterns. A bare framework name or
/// generic HTML word matches far too many pages to be evidence of anything.
const PATTERN_DENYLIST: [&str; 23] = [
    "noscript", "script", "meta", "title", "head", "body", "div", "span", "style", "button",
    "submit", "login", "admin", "cart", "http", "https", "paypal", "react", "vue", "angular",
    "jquery", "svelte", "wagtail",
];

/// Generic HTML tags disallowed as sole DOM selectors.
const DOM_TAG_DENYLIST: [&str; 13] = [
    "a", "body", "div", "span", "p", "script", "style", "link", "head", "title", "footer",
    "header", "main",
];

/// A reasonable minimum number of alphanumeric characters for a significant pattern.
const MIN_PATTERN_ALNUM: usize = 4;

static LOOKAROUND_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\(\?<?[=!][^)]*\)").expect("lookaround regex is valid")
});

static BACKREFERENCE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([^\\])\\[1-9][0-9]*").expect("backreference regex is valid")
});

static LEADING_BACKREFERENCE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\\[1-9][0-9]*").expect("leading backreference regex is valid")
});

/// Matches `\N` submatch references inside a version template.
static TEMPLATE_REF_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\[1-9]").expect("template ref regex is valid"));

/// How a pattern string is interpreted at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PatternKind {
    /// A regular expression, cleaned through the AST pass.
    Regex,
    /// A CSS selector (the `dom` vector); never fed to the regex AST printer,
    /// which would corrupt attribute selectors.
    Selector,
}

/// Key normalization for name-indexed pattern maps.
#[derive(Debug, Clone, Copy)]
enum KeyCase {
    /// HTTP-semantics names (headers, cookies, meta) are case-insensitive.
    Lower,
    /// DNS record types use the conventional upper-case spelling.
    Upper,
    /// JavaScript property paths and issuer field names are kept as-is.
    Preserve,
}

/// Normalizes the merged raw technology map into the strict schema.
pub fn normalize(raw_apps: &Map<String, Value>) -> Fingerprints {
    let mut out = Fingerprints::default();
    for (app, value) in raw_apps {
        let Some(fields) = value.as_object() else {
            log::warn!("[normalize] technology {app} is not an object, skipping");
            continue;
        };
        out.apps.insert(app.clone(), normalize_fingerprint(app, fields));
    }
    out
}

fn normalize_fingerprint(app: &str, fields: &Map<String, Value>) -> Fingerprint {
    Fingerprint {
        css: normalize_pattern_array(fields.get("css"), app, PatternKind::Regex),
        cookies: normalize_pattern_map(fields.get("cookies"), app, KeyCase::Lower),
        js: normalize_pattern_map(fields.get("js"), app, KeyCase::Preserve),
        headers: normalize_pattern_map(fields.get("headers"), app, KeyCase::Lower),
        html: normalize_pattern_array(fields.get("html"), app, PatternKind::Regex),
        script: normalize_pattern_array(fields.get("scripts"), app, PatternKind::Regex),
        script_src: normalize_pattern_array(fields.get("scriptSrc"), app, PatternKind::Regex),
        meta: normalize_meta_map(fields.get("meta"), app),
        url: normalize_pattern_array(fields.get("url"), app, PatternKind::Regex),
        robots: normalize_pattern_array(fields.get("robots"), app, PatternKind::Regex),
        dom: normalize_pattern_array(fields.get("dom"), app, PatternKind::Selector),
        dns: normalize_pattern_map(fields.get("dns"), app, KeyCase::Upper),
        cert_issuer: normalize_pattern_map(fields.get("certIssuer"), app, KeyCase::Preserve),
        implies: normalize_string_array(fields.get("implies")),
        cats: normalize_cats(fields.get("cats")),
        description: normalize_string(fields.get("description")),
        website: normalize_string(fields.get("website")),
        icon: normalize_string(fields.get("icon")),
        cpe: normalize_string(fields.get("cpe")),
    }
}

/// Coerces a scalar-vector field (string, array, or DOM object) into a
/// pattern list. Unknown shapes are logged and discarded.
fn normalize_pattern_array(value: Option<&Value>, app: &str, kind: PatternKind) -> Vec<ParsedPattern> {
    let mut patterns = Vec::new();
    match value {
        None | Some(Value::Null) => {}
        Some(single @ Value::String(_)) => {
            if let Some(p) = normalize_pattern_value(single, app, kind) {
                patterns.push(p);
            }
        }
        Some(Value::Array(items)) => {
            for item in items {
                if let Some(p) = normalize_pattern_value(item, app, kind) {
                    patterns.push(p);
                }
            }
        }
        Some(Value::Object(map)) if kind == PatternKind::Selector => {
            // The richer DOM form maps each selector to text/attribute checks.
            // The keys are the selectors; the checks are reduced to existence.
            for key in map.keys() {
                if let Some(p) = normalize_pattern_value(&Value::String(key.clone()), app, kind) {
                    patterns.push(p);
                }
            }
        }
        Some(other) => {
            log::warn!("[normalize] unhandled pattern shape for app {app}: {other}");
        }
    }
    patterns
}

/// Coerces a name-indexed field into a map of single patterns.
fn normalize_pattern_map(
    value: Option<&Value>,
    app: &str,
    key_case: KeyCase,
) -> BTreeMap<String, ParsedPattern> {
    let mut out = BTreeMap::new();
    let Some(Value::Object(map)) = value else {
        if let Some(other) = value {
            if !other.is_null() {
                log::warn!("[normalize] unhandled map shape for app {app}: {other}");
            }
        }
        return out;
    };
    for (key, v) in map {
        if let Some(p) = normalize_pattern_value(v, app, PatternKind::Regex) {
            let key = match key_case {
                KeyCase::Lower => key.to_lowercase(),
                KeyCase::Upper => key.to_uppercase(),
                KeyCase::Preserve => key.clone(),
            };
            out.insert(key, p);
        }
    }
    out
}

/// Coerces the meta field: a map from name to a pattern or a pattern list.
fn normalize_meta_map(value: Option<&Value>, app: &str) -> BTreeMap<String, Vec<ParsedPattern>> {
    let mut out = BTreeMap::new();
    let Some(Value::Object(map)) = value else {
        return out;
    };
    for (key, v) in map {
        let patterns = match v {
            Value::Array(items) => items
                .iter()
                .filter_map(|item| normalize_pattern_value(item, app, PatternKind::Regex))
                .collect(),
            other => normalize_pattern_value(other, app, PatternKind::Regex)
                .map(|p| vec![p])
                .unwrap_or_default(),
        };
        if !patterns.is_empty() {
            out.insert(key.to_lowercase(), patterns);
        }
    }
    out
}

/// Normalizes one raw pattern value into a [`ParsedPattern`], or rejects it.
fn normalize_pattern_value(value: &Value, app: &str, kind: PatternKind) -> Option<ParsedPattern> {
    let raw = match value {
        Value::String(s) => s.as_str(),
        Value::Object(map) => map.get("regex").and_then(Value::as_str)?,
        other => {
            log::warn!("[normalize] unhandled pattern value for app {app}: {other}");
            return None;
        }
    };
    if raw.is_empty() {
        return None;
    }

    let (regex_part, commands) = parse_pattern_dsl(raw);

    let cleaned = match kind {
        PatternKind::Regex => clean_regex(&regex_part, keeps_captures(&commands))?,
        PatternKind::Selector => regex_part.trim().to_string(),
    };

    // Quality gates: reject trivial and low-signal patterns outright.
    if cleaned.is_empty() || cleaned == "." || cleaned == ".*" {
        return None;
    }
    let lowered = cleaned.to_lowercase();
    if PATTERN_DENYLIST.contains(&lowered.as_str()) {
        return None;
    }
    if cleaned.chars().filter(char::is_ascii_alphanumeric).count() < MIN_PATTERN_ALNUM {
        return None;
    }

    match kind {
        PatternKind::Selector => {
            // A bare generic tag or a selector with no specificity character
            // is useless as evidence.
            if DOM_TAG_DENYLIST.contains(&lowered.as_str()) {
                return None;
            }
            if !cleaned.contains(['.', '#', '[']) {
                return None;
            }
            // Selectors are validated as selectors, not regexes.
            if scraper::Selector::parse(&cleaned).is_err() {
                return None;
            }
        }
        PatternKind::Regex => {
            // Final validation: the runtime compiles with the case-insensitive flag.
            if Regex::new(&format!("(?i){cleaned}")).is_err() {
                return None;
            }
        }
    }

    Some(ParsedPattern {
        regex: cleaned,
        commands,
    })
}

/// Splits a Wappalyzer DSL pattern string into its regex component and the
/// backslash-semicolon-separated directives that follow it.
fn parse_pattern_dsl(raw: &str) -> (String, BTreeMap<String, String>) {
    let mut parts = raw.split("\\;");
    let regex = parts.next().unwrap_or_default().to_string();
    let mut commands = BTreeMap::new();
    for part in parts {
        if let Some((key, value)) = part.split_once(':') {
            commands.entry(key.to_string()).or_insert_with(|| value.to_string());
        }
    }
    (regex, commands)
}

/// True when the pattern's version template references submatch ordinals, in
/// which case its capture groups must survive cleaning.
fn keeps_captures(commands: &BTreeMap<String, String>) -> bool {
    commands
        .get("version")
        .map(|t| TEMPLATE_REF_RE.is_match(t))
        .unwrap_or(false)
}

/// Cleans one regex component: strips metadata remnants, lookarounds, and
/// backreferences, then parses it into an AST and rewrites it into a form the
/// runtime dialect accepts. Returns `None` if the pattern is unsalvageable.
fn clean_regex(raw: &str, keep_captures: bool) -> Option<String> {
    let mut cleaned = raw.to_string();

    // Wappalyzer metadata markers, defensively: the DSL split removes these,
    // but some upstream patterns embed them without the escape.
    if let Some(idx) = cleaned.find("\\;version:") {
        cleaned.truncate(idx);
    }
    if let Some(idx) = cleaned.find("\\;confidence:") {
        cleaned.truncate(idx);
    }
    let mut cleaned = cleaned.trim().to_string();
    if cleaned.is_empty() {
        return None;
    }

    // The runtime dialect supports neither lookaround nor backreferences.
    if LOOKAROUND_RE.is_match(&cleaned) {
        cleaned = LOOKAROUND_RE.replace_all(&cleaned, "").into_owned();
    }
    cleaned = LEADING_BACKREFERENCE_RE.replace(&cleaned, "").into_owned();
    cleaned = BACKREFERENCE_RE.replace_all(&cleaned, "$1").into_owned();

    if !parentheses_balanced(&cleaned) {
        return None;
    }

    // Parse into an AST and unwrap capture groups. Upstream patterns use
    // captures only for version extraction, so patterns without a submatch
    // template lose the capturing semantics entirely; patterns with one keep
    // their groups so the template ordinals stay valid.
    let hir = regex_syntax::Parser::new().parse(&cleaned).ok()?;
    let rewritten = if keep_captures {
        hir
    } else {
        unwrap_capture_groups(hir)
    };
    Some(rewritten.to_string())
}

/// Checks if parentheses are balanced in a regex string.
fn parentheses_balanced(s: &str) -> bool {
    let mut balance: i64 = 0;
    let mut escaped = false;
    for c in s.chars() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '(' => balance += 1,
            ')' => balance -= 1,
            _ => {}
        }
        if balance < 0 {
            return false;
        }
    }
    balance == 0
}

/// Recursively replaces every capture group node with its inner expression,
/// stripping the parentheses and the capturing semantics.
fn unwrap_capture_groups(hir: Hir) -> Hir {
    match hir.into_kind() {
        HirKind::Capture(cap) => unwrap_capture_groups(*cap.sub),
        HirKind::Concat(subs) => {
            Hir::concat(subs.into_iter().map(unwrap_capture_groups).collect())
        }
        HirKind::Alternation(subs) => {
            Hir::alternation(subs.into_iter().map(unwrap_capture_groups).collect())
        }
        HirKind::Repetition(rep) => Hir::repetition(Repetition {
            min: rep.min,
            max: rep.max,
            greedy: rep.greedy,
            sub: Box::new(unwrap_capture_groups(*rep.sub)),
        }),
        HirKind::Empty => Hir::empty(),
        HirKind::Literal(lit) => Hir::literal(lit.0),
        HirKind::Class(class) => Hir::class(class),
        HirKind::Look(look) => Hir::look(look),
    }
}

fn normalize_string_array(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::String(s)) => vec![s.clone()],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}

fn normalize_cats(value: Option<&Value>) -> Vec<i64> {
    match value {
        Some(Value::Number(n)) => n.as_i64().map(|v| vec![v]).unwrap_or_default(),
        Some(Value::Array(items)) => items.iter().filter_map(Value::as_i64).collect(),
        _ => Vec::new(),
    }
}

fn normalize_string(value: Option<&Value>) -> String {
    value.and_then(Value::as_str).unwrap_or_default().to_string()
}

/// Re-serializes the raw categories file with sorted keys and string-typed
/// priorities, so the output is deterministic.
pub(crate) fn normalize_categories(data: &[u8]) -> Result<String, PipelineError> {
    let categories: BTreeMap<String, Category> = serde_json::from_slice(data)?;
    Ok(serde_json::to_string_pretty(&categories)?)
}
