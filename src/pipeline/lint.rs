//! Pattern lint: the zero-invalid gate.
//!
//! Compiles every regex in the normalized database with the case-insensitive
//! flag, exactly as the runtime matcher builder will. Any failure aborts the
//! pipeline; the database is never emitted with an invalid pattern.
//!
//! DOM entries hold CSS selectors rather than regexes and are validated with
//! the selector parser instead.

use regex::Regex;
use scraper::Selector;

use crate::error_handling::PipelineError;
use crate::pipeline::types::{Fingerprints, ParsedPattern};

/// Validates all patterns in the normalized database.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidPatterns`] naming every `(app, field)`
/// pair whose pattern the runtime would reject.
pub fn lint(fingerprints: &Fingerprints) -> Result<(), PipelineError> {
    let mut errs: Vec<String> = Vec::new();

    for (app, fp) in &fingerprints.apps {
        let scalar_fields: [(&str, &[ParsedPattern]); 6] = [
            ("css", &fp.css),
            ("html", &fp.html),
            ("scripts", &fp.script),
            ("scriptSrc", &fp.script_src),
            ("url", &fp.url),
            ("robots", &fp.robots),
        ];
        for (field, patterns) in scalar_fields {
            for pat in patterns {
                if let Err(e) = lint_pattern(&pat.regex) {
                    errs.push(format!("invalid regex for app {app}, field {field}: {e}"));
                }
            }
        }

        for (key, pat) in &fp.cookies {
            if let Err(e) = lint_pattern(&pat.regex) {
                errs.push(format!("invalid regex for app {app}, field cookies[{key}]: {e}"));
            }
        }
        for (key, pat) in &fp.js {
            if let Err(e) = lint_pattern(&pat.regex) {
                errs.push(format!("invalid regex for app {app}, field js[{key}]: {e}"));
            }
        }
        for (key, pat) in &fp.headers {
            if let Err(e) = lint_pattern(&pat.regex) {
                errs.push(format!("invalid regex for app {app}, field headers[{key}]: {e}"));
            }
        }
        for (key, patterns) in &fp.meta {
            for pat in patterns {
                if let Err(e) = lint_pattern(&pat.regex) {
                    errs.push(format!("invalid regex for app {app}, field meta[{key}]: {e}"));
                }
            }
        }
        for (key, pat) in &fp.dns {
            if let Err(e) = lint_pattern(&pat.regex) {
                errs.push(format!("invalid regex for app {app}, field dns[{key}]: {e}"));
            }
        }
        for (key, pat) in &fp.cert_issuer {
            if let Err(e) = lint_pattern(&pat.regex) {
                errs.push(format!(
                    "invalid regex for app {app}, field certIssuer[{key}]: {e}"
                ));
            }
        }

        for pat in &fp.dom {
            if Selector::parse(&pat.regex).is_err() {
                errs.push(format!(
                    "invalid CSS selector for app {app}, field dom: `{}`",
                    pat.regex
                ));
            }
        }
    }

    if errs.is_empty() {
        Ok(())
    } else {
        Err(PipelineError::InvalidPatterns {
            count: errs.len(),
            details: errs.join("\n"),
        })
    }
}

/// Compiles one regex with case-insensitivity, matching runtime behavior.
fn lint_pattern(regex: &str) -> Result<(), regex::Error> {
    // An empty regex is the always-matches sentinel and needs no compilation.
    if regex.is_empty() {
        return Ok(());
    }
    Regex::new(&format!("(?i){regex}")).map(|_| ())
}
