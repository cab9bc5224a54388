//! Detection model and matcher orchestration.
//!
//! Each vector matcher is a free function over `(context, detected)`; the
//! registry below runs them in a fixed order, so collisions between vectors
//! for the same technology resolve deterministically (last writer wins).

pub(crate) mod implies;
pub(crate) mod js;
mod vectors;

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Serialize;

use crate::gather::AnalysisData;
use crate::matcher::version::extract_version;
use crate::matcher::{CompiledMatcher, PatternInfo};
use crate::page::PageData;

/// How strong a detection signal is. Assigned per vector; only
/// high-confidence detections propagate implications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    /// Weak signal: visible body text, DOM existence
    Low,
    /// Medium signal: meta tags, inline script/CSS, URL, robots.txt, implications
    Medium,
    /// Strong signal: headers, cookies, script sources, JS properties, DNS, cert issuer
    High,
}

/// One detected technology, with an audit trail describing how.
#[derive(Debug, Clone, Serialize)]
pub struct Detection {
    /// Extracted version string, empty when the pattern has no version template
    #[serde(skip_serializing_if = "String::is_empty")]
    pub version: String,
    /// The vector that produced the detection, e.g. `header:Server`, `dns:TXT`
    pub detected_by: String,
    /// The pattern that triggered the match
    #[serde(skip_serializing_if = "String::is_empty")]
    pub matched_pattern: String,
    /// The specific value the pattern matched against
    #[serde(skip_serializing_if = "String::is_empty")]
    pub matched_value: String,
    /// Signal strength for this vector
    pub confidence: Confidence,
}

/// The per-request technology map.
pub type DetectedMap = BTreeMap<String, Detection>;

/// Everything a vector matcher may consult. Matchers perform no I/O.
pub(crate) struct MatcherContext<'a> {
    pub matcher: &'a CompiledMatcher,
    pub data: &'a AnalysisData,
    pub page: &'a PageData,
    pub regex_timeout: Duration,
}

impl MatcherContext<'_> {
    /// Builds a detection from a successful pattern run.
    fn detection(
        &self,
        pattern: &PatternInfo,
        submatches: &[Option<String>],
        detected_by: String,
        confidence: Confidence,
    ) -> Detection {
        Detection {
            version: extract_version(&pattern.commands, submatches),
            detected_by,
            matched_pattern: pattern.source.clone(),
            matched_value: submatches
                .first()
                .and_then(|m| m.clone())
                .unwrap_or_default(),
            confidence,
        }
    }
}

/// A vector matcher: reads gathered evidence, writes detections.
type VectorMatcher = fn(&MatcherContext<'_>, &mut DetectedMap);

/// The fixed matcher registry. Network-derived vectors run first, then the
/// response headers, then the body-derived vectors.
const MATCHERS: [VectorMatcher; 13] = [
    vectors::match_url,
    vectors::match_robots,
    vectors::match_dns,
    vectors::match_cert_issuer,
    vectors::match_headers,
    vectors::match_cookies,
    vectors::match_script_src,
    vectors::match_meta,
    vectors::match_script,
    vectors::match_html,
    vectors::match_js,
    vectors::match_css,
    vectors::match_dom,
];

/// Runs every vector matcher over the gathered evidence.
pub(crate) fn run_all_matchers(ctx: &MatcherContext<'_>, detected: &mut DetectedMap) {
    for matcher in MATCHERS {
        matcher(ctx, detected);
    }
}
