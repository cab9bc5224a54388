//! Optional external script fetching.
//!
//! When enabled, a bounded number of the page's `<script src>` targets are
//! downloaded and their contents join the inline scripts as evidence for the
//! script and JS-property vectors. Disabled by default: it adds one request
//! per asset and most fingerprints trigger on the source URL alone.

use futures::StreamExt;
use log::debug;
use url::Url;

use crate::config::{ASSET_FETCH_TIMEOUT, MAX_ASSET_SIZE};

/// Downloads up to `limit` external scripts referenced by the page.
///
/// Relative `src` values are resolved against the page URL. Individual
/// failures are logged and skipped; asset fetching never fails an analysis.
pub(crate) async fn fetch_external_scripts(
    client: &reqwest::Client,
    page_url: &str,
    script_srcs: &[String],
    limit: usize,
) -> Vec<String> {
    let Ok(base) = Url::parse(page_url) else {
        return Vec::new();
    };

    let targets: Vec<Url> = script_srcs
        .iter()
        .filter_map(|src| base.join(src).ok())
        .filter(|url| matches!(url.scheme(), "http" | "https"))
        .take(limit)
        .collect();

    let fetches = targets.iter().map(|url| async move {
        match tokio::time::timeout(ASSET_FETCH_TIMEOUT, fetch_asset(client, url)).await {
            Ok(Ok(content)) => Some(content),
            Ok(Err(e)) => {
                debug!("failed to fetch script asset {url}: {e}");
                None
            }
            Err(_) => {
                debug!("script asset fetch timed out: {url}");
                None
            }
        }
    });

    futures::future::join_all(fetches)
        .await
        .into_iter()
        .flatten()
        .collect()
}

/// Fetches one asset with the per-asset size cap.
async fn fetch_asset(client: &reqwest::Client, url: &Url) -> Result<String, anyhow::Error> {
    let response = client.get(url.as_str()).send().await?;
    if !response.status().is_success() {
        return Err(anyhow::anyhow!("status {}", response.status()));
    }

    let mut content = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if content.len() + chunk.len() > MAX_ASSET_SIZE {
            let remaining = MAX_ASSET_SIZE - content.len();
            content.extend_from_slice(&chunk[..remaining]);
            break;
        }
        content.extend_from_slice(&chunk);
    }
    Ok(String::from_utf8_lossy(&content).into_owned())
}
