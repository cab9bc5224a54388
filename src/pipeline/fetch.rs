//! Upstream archive download and in-memory extraction.
//!
//! The upstream browser extension ships as an XPI, which is a plain ZIP file.
//! The fetcher downloads it with a hard size cap, walks the entries in
//! memory, merges every `technologies/*.json` object into one map, and
//! captures the raw bytes of `categories.json`.

use std::io::{Cursor, Read};
use std::time::Duration;

use futures::StreamExt;
use log::{debug, info};
use serde_json::{Map, Value};
use zip::ZipArchive;

use crate::config::{DEFAULT_USER_AGENT, MAX_ARCHIVE_SIZE, WAPPALYZER_ARCHIVE_URL};
use crate::error_handling::PipelineError;

/// Maximum decompressed size per archive entry (10 MB) — guards against zip bombs.
const MAX_ENTRY_SIZE: u64 = 10 * 1024 * 1024;

/// Downloads the upstream archive and extracts the technology definitions and
/// the category table.
///
/// # Returns
///
/// The merged raw technology map (last write wins on duplicate names) and the
/// raw bytes of `categories.json`.
///
/// # Errors
///
/// Fails if the download fails, the archive is unreadable, no technology
/// files were found, or `categories.json` is missing.
pub async fn fetch_archive() -> Result<(Map<String, Value>, Vec<u8>), PipelineError> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(60))
        .user_agent(DEFAULT_USER_AGENT)
        .build()
        .map_err(|e| PipelineError::Download(e.to_string()))?;

    info!("Downloading fingerprint archive from {WAPPALYZER_ARCHIVE_URL}");
    let response = client
        .get(WAPPALYZER_ARCHIVE_URL)
        .send()
        .await
        .map_err(|e| PipelineError::Download(e.to_string()))?;

    if !response.status().is_success() {
        return Err(PipelineError::Download(format!(
            "bad status code fetching archive: {}",
            response.status()
        )));
    }

    let mut body = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| PipelineError::Download(e.to_string()))?;
        if body.len() + chunk.len() > MAX_ARCHIVE_SIZE {
            return Err(PipelineError::Download(format!(
                "archive exceeds the {MAX_ARCHIVE_SIZE} byte cap"
            )));
        }
        body.extend_from_slice(&chunk);
    }
    info!("Downloaded archive ({} bytes)", body.len());

    extract_archive(&body)
}

/// Walks a ZIP archive in memory, merging technology files and capturing the
/// category table. Separated from the download so tooling and tests can feed
/// an archive they already hold.
pub fn extract_archive(bytes: &[u8]) -> Result<(Map<String, Value>, Vec<u8>), PipelineError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| PipelineError::Archive(e.to_string()))?;

    let mut merged_apps = Map::new();
    let mut categories_data: Vec<u8> = Vec::new();

    for i in 0..archive.len() {
        let mut file = archive
            .by_index(i)
            .map_err(|e| PipelineError::Archive(e.to_string()))?;
        let name = file.name().to_string();

        if name.starts_with("technologies/") && name.ends_with(".json") {
            let mut content = String::new();
            file.by_ref()
                .take(MAX_ENTRY_SIZE)
                .read_to_string(&mut content)
                .map_err(|e| PipelineError::Archive(format!("failed to read {name}: {e}")))?;
            let tech_data: Map<String, Value> = serde_json::from_str(&content)
                .map_err(|e| PipelineError::Archive(format!("failed to decode {name}: {e}")))?;
            debug!("Merging {} technologies from {name}", tech_data.len());
            // Last write wins on duplicate keys.
            merged_apps.extend(tech_data);
        } else if name == "categories.json" {
            file.by_ref()
                .take(MAX_ENTRY_SIZE)
                .read_to_end(&mut categories_data)
                .map_err(|e| PipelineError::Archive(format!("failed to read {name}: {e}")))?;
        }
    }

    if merged_apps.is_empty() {
        return Err(PipelineError::NoTechnologies);
    }
    if categories_data.is_empty() {
        return Err(PipelineError::MissingCategories);
    }

    Ok((merged_apps, categories_data))
}
