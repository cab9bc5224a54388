//! Concurrent evidence gathering.
//!
//! One analysis launches three tasks against a single shared deadline: the
//! main page fetch, the robots.txt fetch, and the DNS lookups. Errors are
//! aggregated per task; the main page and DNS are fatal, robots is not.

mod assets;
mod robots;

use futures::StreamExt;
use hickory_resolver::TokioAsyncResolver;
use log::debug;
use reqwest::header::HeaderMap;
use url::Url;

use crate::config::{EngineConfig, DNS_TASK_TIMEOUT, MAX_BODY_SIZE, ROBOTS_TIMEOUT};
use crate::error_handling::AnalysisError;

pub(crate) use assets::fetch_external_scripts;
pub(crate) use robots::fetch_robots;

/// Raw evidence collected for a single analysis run.
#[derive(Debug, Default)]
pub(crate) struct AnalysisData {
    /// The input URL, matched by the URL vector
    pub target_url: String,
    /// Response headers of the main page fetch
    pub headers: HeaderMap,
    /// Main page body, capped at [`MAX_BODY_SIZE`]
    pub body: Vec<u8>,
    /// robots.txt content when the fetch returned HTTP 200
    pub robots_content: Option<String>,
    /// DNS records keyed by upper-cased record type
    pub dns_records: std::collections::HashMap<String, Vec<String>>,
    /// Issuer common name captured during the TLS handshake, if verified
    pub cert_issuer: Option<String>,
    /// Contents of fetched external scripts, when asset fetching is enabled
    pub external_scripts: Vec<String>,
}

/// Gathers all evidence for `target_url` concurrently.
///
/// Always returns the partial data it managed to collect together with the
/// per-task error aggregate; the caller decides fatality via
/// [`AnalysisError::is_fatal`].
pub(crate) async fn gather(
    client: &reqwest::Client,
    resolvers: &[TokioAsyncResolver],
    target_url: &str,
    config: &EngineConfig,
) -> (AnalysisData, AnalysisError) {
    let mut data = AnalysisData {
        target_url: target_url.to_string(),
        ..Default::default()
    };
    let mut errors = AnalysisError::default();

    let host = match Url::parse(target_url) {
        Ok(url) => url.host_str().map(str::to_string),
        Err(e) => {
            errors.main_page = Some(anyhow::anyhow!("invalid URL: {e}"));
            return (data, errors);
        }
    };
    let Some(host) = host else {
        errors.main_page = Some(anyhow::anyhow!("URL has no host: {target_url}"));
        return (data, errors);
    };

    let main_task = tokio::time::timeout(config.request_timeout, fetch_main_page(client, target_url));
    let robots_task = tokio::time::timeout(ROBOTS_TIMEOUT, fetch_robots(client, target_url));
    let dns_task = tokio::time::timeout(DNS_TASK_TIMEOUT, crate::dns::lookup_all(resolvers, &host));

    let (main_result, robots_result, dns_result) = tokio::join!(main_task, robots_task, dns_task);

    match main_result {
        Ok(Ok((headers, body))) => {
            data.headers = headers;
            data.body = body;
        }
        Ok(Err(e)) => errors.main_page = Some(e),
        Err(_) => {
            errors.main_page = Some(anyhow::anyhow!(
                "main page fetch exceeded the {:?} deadline",
                config.request_timeout
            ));
        }
    }

    match robots_result {
        Ok(Ok(content)) => data.robots_content = content,
        Ok(Err(e)) => errors.robots = Some(e),
        Err(_) => {
            errors.robots = Some(anyhow::anyhow!(
                "robots.txt fetch exceeded the {ROBOTS_TIMEOUT:?} deadline"
            ));
        }
    }

    match dns_result {
        Ok(Ok(records)) => data.dns_records = records,
        Ok(Err(e)) => errors.dns = Some(e),
        Err(_) => {
            errors.dns = Some(anyhow::anyhow!(
                "DNS lookups exceeded the {DNS_TASK_TIMEOUT:?} deadline"
            ));
        }
    }

    (data, errors)
}

/// Fetches the main page, returning its headers and the capped body.
async fn fetch_main_page(
    client: &reqwest::Client,
    url: &str,
) -> Result<(HeaderMap, Vec<u8>), anyhow::Error> {
    let response = client.get(url).send().await?;
    let headers = response.headers().clone();

    let mut body = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if body.len() + chunk.len() > MAX_BODY_SIZE {
            let remaining = MAX_BODY_SIZE - body.len();
            body.extend_from_slice(&chunk[..remaining]);
            debug!("main page body truncated at {MAX_BODY_SIZE} bytes for {url}");
            break;
        }
        body.extend_from_slice(&chunk);
    }
    Ok((headers, body))
}
