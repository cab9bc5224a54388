//! robots.txt fetching.

use futures::StreamExt;
use url::Url;

use crate::config::MAX_ROBOTS_SIZE;

/// Fetches `<scheme>://<host>/robots.txt` for the target URL.
///
/// An HTTP 200 response yields the content (capped at 1 MB); any other status
/// yields no content but is not an error. Transport errors are reported to
/// the caller, which treats them as non-fatal.
pub(crate) async fn fetch_robots(
    client: &reqwest::Client,
    target_url: &str,
) -> Result<Option<String>, anyhow::Error> {
    let mut robots_url = Url::parse(target_url)?;
    robots_url.set_path("/robots.txt");
    robots_url.set_query(None);
    robots_url.set_fragment(None);

    let response = client.get(robots_url.as_str()).send().await?;
    if response.status() != reqwest::StatusCode::OK {
        return Ok(None);
    }

    let mut content = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if content.len() + chunk.len() > MAX_ROBOTS_SIZE {
            let remaining = MAX_ROBOTS_SIZE - content.len();
            content.extend_from_slice(&chunk[..remaining]);
            break;
        }
        content.extend_from_slice(&chunk);
    }
    Ok(Some(String::from_utf8_lossy(&content).into_owned()))
}
