//! The thirteen vector matchers.
//!
//! Every matcher iterates its slice of the compiled matcher, runs each
//! pattern under the watchdog, and on a successful submatch records a
//! detection under the owning application name, overwriting any prior
//! detection for the same name. Context isolation is strict: a pattern
//! declared for one vector only ever sees that vector's evidence.

use reqwest::header::SET_COOKIE;

use crate::utils::canonical_header_name;

use super::{Confidence, DetectedMap, MatcherContext};

/// Matches the input URL string.
pub(super) fn match_url(ctx: &MatcherContext<'_>, detected: &mut DetectedMap) {
    for pi in &ctx.matcher.url {
        if let Some(subs) = pi.run(&ctx.data.target_url, ctx.regex_timeout) {
            detected.insert(
                pi.app.clone(),
                ctx.detection(pi, &subs, "url".to_string(), Confidence::Medium),
            );
        }
    }
}

/// Matches the robots.txt content, if the fetch produced any.
pub(super) fn match_robots(ctx: &MatcherContext<'_>, detected: &mut DetectedMap) {
    let Some(robots) = &ctx.data.robots_content else {
        return;
    };
    for pi in &ctx.matcher.robots {
        if let Some(subs) = pi.run(robots, ctx.regex_timeout) {
            detected.insert(
                pi.app.clone(),
                ctx.detection(pi, &subs, "robots".to_string(), Confidence::Medium),
            );
        }
    }
}

/// Matches DNS record values, keyed by record type.
pub(super) fn match_dns(ctx: &MatcherContext<'_>, detected: &mut DetectedMap) {
    for (record_type, patterns) in &ctx.matcher.dns {
        let Some(records) = ctx.data.dns_records.get(record_type) else {
            continue;
        };
        for pi in patterns {
            for record in records {
                if let Some(subs) = pi.run(record, ctx.regex_timeout) {
                    detected.insert(
                        pi.app.clone(),
                        ctx.detection(pi, &subs, format!("dns:{record_type}"), Confidence::High),
                    );
                    break;
                }
            }
        }
    }
}

/// Matches the cached certificate issuer for the target host, if any.
pub(super) fn match_cert_issuer(ctx: &MatcherContext<'_>, detected: &mut DetectedMap) {
    let Some(issuer) = &ctx.data.cert_issuer else {
        return;
    };
    // The field-name key is not discriminating; every cert pattern sees the
    // one cached issuer string.
    for patterns in ctx.matcher.cert_issuer.values() {
        for pi in patterns {
            if let Some(subs) = pi.run(issuer, ctx.regex_timeout) {
                detected.insert(
                    pi.app.clone(),
                    ctx.detection(pi, &subs, "certIssuer".to_string(), Confidence::High),
                );
            }
        }
    }
}

/// Matches response header values, keyed by lower-cased header name.
pub(super) fn match_headers(ctx: &MatcherContext<'_>, detected: &mut DetectedMap) {
    for name in ctx.data.headers.keys() {
        let Some(patterns) = ctx.matcher.headers.get(name.as_str()) else {
            continue;
        };
        for pi in patterns {
            for value in ctx.data.headers.get_all(name) {
                let Ok(value) = value.to_str() else {
                    continue;
                };
                if let Some(subs) = pi.run(value, ctx.regex_timeout) {
                    detected.insert(
                        pi.app.clone(),
                        ctx.detection(
                            pi,
                            &subs,
                            format!("header:{}", canonical_header_name(name.as_str())),
                            Confidence::High,
                        ),
                    );
                    break;
                }
            }
        }
    }
}

/// Parses every Set-Cookie header and matches cookie values, keyed by
/// lower-cased cookie name. Malformed cookies are skipped.
pub(super) fn match_cookies(ctx: &MatcherContext<'_>, detected: &mut DetectedMap) {
    let mut cookies: Vec<(String, String)> = Vec::new();
    for raw in ctx.data.headers.get_all(SET_COOKIE) {
        let Ok(raw) = raw.to_str() else {
            continue;
        };
        let Some(pair) = raw.split(';').next() else {
            continue;
        };
        let Some((name, value)) = pair.split_once('=') else {
            continue;
        };
        let name = name.trim().to_lowercase();
        if name.is_empty() {
            continue;
        }
        cookies.push((name, value.trim().to_string()));
    }

    for (name, value) in &cookies {
        let Some(patterns) = ctx.matcher.cookies.get(name) else {
            continue;
        };
        for pi in patterns {
            if let Some(subs) = pi.run(value, ctx.regex_timeout) {
                detected.insert(
                    pi.app.clone(),
                    ctx.detection(pi, &subs, format!("cookie:{name}"), Confidence::High),
                );
                break;
            }
        }
    }
}

/// Matches every `<script src>` value.
pub(super) fn match_script_src(ctx: &MatcherContext<'_>, detected: &mut DetectedMap) {
    for pi in &ctx.matcher.script_src {
        for src in &ctx.page.script_srcs {
            if let Some(subs) = pi.run(src, ctx.regex_timeout) {
                detected.insert(
                    pi.app.clone(),
                    ctx.detection(pi, &subs, "scriptSrc".to_string(), Confidence::High),
                );
                break;
            }
        }
    }
}

/// Matches meta tag content, keyed by lower-cased meta name.
pub(super) fn match_meta(ctx: &MatcherContext<'_>, detected: &mut DetectedMap) {
    for (name, contents) in &ctx.page.meta_content {
        let Some(patterns) = ctx.matcher.meta.get(name) else {
            continue;
        };
        for pi in patterns {
            for content in contents {
                if let Some(subs) = pi.run(content, ctx.regex_timeout) {
                    detected.insert(
                        pi.app.clone(),
                        ctx.detection(pi, &subs, format!("meta:{name}"), Confidence::Medium),
                    );
                    break;
                }
            }
        }
    }
}

/// Matches each script block: inline scripts, plus fetched external scripts
/// when asset fetching is enabled. Context-scoped: script content that exists
/// only in comments or visible text never reaches this matcher.
pub(super) fn match_script(ctx: &MatcherContext<'_>, detected: &mut DetectedMap) {
    for pi in &ctx.matcher.script {
        if detected.contains_key(&pi.app) {
            continue;
        }
        for script in ctx
            .page
            .inline_scripts
            .iter()
            .chain(&ctx.data.external_scripts)
        {
            if let Some(subs) = pi.run(script, ctx.regex_timeout) {
                detected.insert(
                    pi.app.clone(),
                    ctx.detection(pi, &subs, "script".to_string(), Confidence::Medium),
                );
                break;
            }
        }
    }
}

/// Matches the extracted visible body text, not the raw body.
pub(super) fn match_html(ctx: &MatcherContext<'_>, detected: &mut DetectedMap) {
    for pi in &ctx.matcher.html {
        if detected.contains_key(&pi.app) {
            continue;
        }
        if let Some(subs) = pi.run(&ctx.page.visible_text, ctx.regex_timeout) {
            detected.insert(
                pi.app.clone(),
                ctx.detection(pi, &subs, "html".to_string(), Confidence::Low),
            );
        }
    }
}

/// Scans inline scripts for property assignments and matches the assigned
/// values against patterns keyed by the exact property path.
pub(super) fn match_js(ctx: &MatcherContext<'_>, detected: &mut DetectedMap) {
    if ctx.matcher.js.is_empty() {
        return;
    }
    for script in ctx
        .page
        .inline_scripts
        .iter()
        .chain(&ctx.data.external_scripts)
    {
        for (path, value) in super::js::extract_properties(script) {
            let Some(patterns) = ctx.matcher.js.get(&path) else {
                continue;
            };
            for pi in patterns {
                if let Some(subs) = pi.run(&value, ctx.regex_timeout) {
                    detected.insert(
                        pi.app.clone(),
                        ctx.detection(pi, &subs, format!("js:{path}"), Confidence::High),
                    );
                    break;
                }
            }
        }
    }
}

/// Matches each inline `<style>` block.
pub(super) fn match_css(ctx: &MatcherContext<'_>, detected: &mut DetectedMap) {
    for css_block in &ctx.page.inline_css {
        for pi in &ctx.matcher.css {
            if detected.contains_key(&pi.app) {
                continue;
            }
            if let Some(subs) = pi.run(css_block, ctx.regex_timeout) {
                detected.insert(
                    pi.app.clone(),
                    ctx.detection(pi, &subs, "css".to_string(), Confidence::Medium),
                );
            }
        }
    }
}

/// Tests each CSS selector for existence against the parsed document.
pub(super) fn match_dom(ctx: &MatcherContext<'_>, detected: &mut DetectedMap) {
    for dpi in &ctx.matcher.dom {
        if ctx.page.document.select(&dpi.selector).next().is_some() {
            detected.insert(
                dpi.app.clone(),
                super::Detection {
                    version: String::new(),
                    detected_by: "dom".to_string(),
                    matched_pattern: dpi.source.clone(),
                    matched_value: "CSS selector matched".to_string(),
                    confidence: Confidence::Low,
                },
            );
        }
    }
}
