//! The analysis engine.
//!
//! The engine is the composition root: it owns the loaded ruleset, the
//! compiled matcher, the HTTP client with its issuer-capturing TLS
//! configuration, and the DNS resolver set. All of it is built once and
//! shared read-only across requests; the only mutable shared state is the
//! per-engine TLS issuer cache.

use std::collections::BTreeMap;
use std::sync::Arc;

use hickory_resolver::TokioAsyncResolver;
use log::debug;
use reqwest::header::HeaderMap;
use url::Url;

use crate::analysis::{implies::run_implies_engine, run_all_matchers, DetectedMap, MatcherContext};
use crate::config::EngineConfig;
use crate::error_handling::{AnalysisError, InitializationError};
use crate::gather::{gather, AnalysisData};
use crate::matcher::CompiledMatcher;
use crate::page::PageData;
use crate::ruleset::{CategoryInfo, FingerprintRuleset};
use crate::tls::IssuerCache;

/// The result of one analysis: the detected technologies plus any non-fatal
/// errors encountered while gathering evidence.
#[derive(Debug)]
pub struct Analysis {
    /// Detected technologies keyed by name
    pub technologies: DetectedMap,
    /// Text of the page's first `<title>`, if any
    pub title: Option<String>,
    /// Non-fatal gathering errors (robots.txt), surfaced for inspection
    pub error: Option<AnalysisError>,
}

/// A web technology detection engine.
///
/// Construction loads the pattern database and builds the matcher; both are
/// immutable afterwards, so one engine serves any number of concurrent
/// analyses.
pub struct Engine {
    ruleset: Arc<FingerprintRuleset>,
    matcher: Arc<CompiledMatcher>,
    client: reqwest::Client,
    resolvers: Arc<Vec<TokioAsyncResolver>>,
    issuer_cache: IssuerCache,
    config: EngineConfig,
}

impl Engine {
    /// Builds an engine over the embedded fingerprint database.
    pub fn new() -> Result<Self, InitializationError> {
        Self::with_config(EngineConfig::default())
    }

    /// Builds an engine over the embedded database with a custom configuration.
    pub fn with_config(config: EngineConfig) -> Result<Self, InitializationError> {
        Self::from_ruleset(FingerprintRuleset::embedded()?, config)
    }

    /// Builds an engine over caller-supplied database JSON. Used by tests and
    /// by tooling that runs against a freshly built database.
    pub fn from_fingerprints(
        fingerprints_json: &str,
        categories_json: &str,
        config: EngineConfig,
    ) -> Result<Self, InitializationError> {
        Self::from_ruleset(
            FingerprintRuleset::from_json(fingerprints_json, categories_json)?,
            config,
        )
    }

    /// Builds an engine over an already-loaded ruleset.
    pub fn from_ruleset(
        ruleset: FingerprintRuleset,
        config: EngineConfig,
    ) -> Result<Self, InitializationError> {
        crate::initialization::init_crypto_provider();
        let matcher = CompiledMatcher::build(&ruleset);
        let issuer_cache = IssuerCache::default();
        let client = crate::initialization::init_client(&config, issuer_cache.clone())?;
        let resolvers = crate::dns::build_resolvers();
        Ok(Self {
            ruleset: Arc::new(ruleset),
            matcher: Arc::new(matcher),
            client,
            resolvers: Arc::new(resolvers),
            issuer_cache,
            config,
        })
    }

    /// Analyzes a URL: gathers evidence concurrently, matches it across every
    /// vector, and resolves implied technologies.
    ///
    /// # Errors
    ///
    /// Returns the aggregated [`AnalysisError`] when the main page fetch or
    /// the DNS step failed. A robots.txt failure is not fatal; it is surfaced
    /// through [`Analysis::error`] instead.
    pub async fn analyze(&self, target_url: &str) -> Result<Analysis, AnalysisError> {
        let (mut data, errors) = gather(
            &self.client,
            &self.resolvers,
            target_url,
            &self.config,
        )
        .await;

        if errors.is_fatal() {
            return Err(errors);
        }

        if self.config.max_external_scripts > 0 {
            let srcs = crate::page::extract_script_srcs(&data.body);
            data.external_scripts = crate::gather::fetch_external_scripts(
                &self.client,
                target_url,
                &srcs,
                self.config.max_external_scripts,
            )
            .await;
        }

        // The TLS verify callback populated the cache during the main fetch.
        if let Ok(url) = Url::parse(target_url) {
            if let Some(host) = url.host_str() {
                data.cert_issuer = self.issuer_cache.get(host);
            }
        }

        let (technologies, title) = self.detect(&data);
        debug!(
            "analysis of {target_url} detected {} technologies",
            technologies.len()
        );

        Ok(Analysis {
            technologies,
            title,
            error: if errors.is_empty() { None } else { Some(errors) },
        })
    }

    /// Fingerprints an already-fetched response without touching the network.
    ///
    /// This is the offline entry point: headers and body are matched across
    /// every header- and body-derived vector, and implications are resolved.
    /// Network-derived vectors (URL, robots, DNS, certificate issuer) see no
    /// evidence and stay silent.
    pub fn fingerprint(&self, headers: &HeaderMap, body: &[u8]) -> DetectedMap {
        let data = AnalysisData {
            headers: headers.clone(),
            body: body.to_vec(),
            ..Default::default()
        };
        self.detect(&data).0
    }

    /// Maps detected technologies to their category IDs and names. IDs
    /// missing from the category table resolve to no name.
    pub fn categories(&self, technologies: &DetectedMap) -> BTreeMap<String, CategoryInfo> {
        technologies
            .keys()
            .filter_map(|name| {
                self.ruleset.apps.get(name).map(|fp| {
                    (
                        name.clone(),
                        CategoryInfo {
                            ids: fp.cats.clone(),
                            names: self.ruleset.category_names(&fp.cats),
                        },
                    )
                })
            })
            .collect()
    }

    /// Runs the full matching stage over gathered evidence. Synchronous: the
    /// parsed DOM never crosses an await point.
    fn detect(&self, data: &AnalysisData) -> (DetectedMap, Option<String>) {
        let page = PageData::from_body(&data.body);
        let ctx = MatcherContext {
            matcher: &self.matcher,
            data,
            page: &page,
            regex_timeout: self.config.regex_timeout,
        };
        let mut detected = DetectedMap::new();
        run_all_matchers(&ctx, &mut detected);
        run_implies_engine(&self.ruleset.apps, &mut detected);

        let title = page.title.trim();
        let title = (!title.is_empty()).then(|| title.to_string());
        (detected, title)
    }
}
