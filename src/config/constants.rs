//! Configuration constants.
//!
//! This module defines all configuration constants used throughout the crate,
//! including timeouts, size limits, and other operational parameters.

use std::time::Duration;

/// Shared deadline for one analysis request.
///
/// Bounds the whole gathering phase: main page fetch, robots.txt fetch, and
/// DNS lookups all observe this deadline.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Child deadline for the robots.txt fetch.
pub const ROBOTS_TIMEOUT: Duration = Duration::from_secs(5);

/// Child deadline for the whole DNS gathering task (all record types).
pub const DNS_TASK_TIMEOUT: Duration = Duration::from_secs(5);

/// Per-query DNS timeout, applied to each (record type, resolver) pair.
pub const DNS_QUERY_TIMEOUT: Duration = Duration::from_secs(2);

/// Upper bound for a single regex execution.
///
/// Patterns are statically validated offline; this is the runtime guard
/// against pathological inputs. A match that exceeds the budget is treated
/// as a non-match.
pub const REGEX_TIMEOUT: Duration = Duration::from_millis(100);

// Response and body size limits
/// Maximum main page body size in bytes (10 MB).
/// Responses are truncated at this size to bound memory per request.
pub const MAX_BODY_SIZE: usize = 10 * 1024 * 1024;
/// Maximum robots.txt body size in bytes (1 MB).
pub const MAX_ROBOTS_SIZE: usize = 1024 * 1024;
/// Maximum upstream fingerprint archive size in bytes (100 MB).
pub const MAX_ARCHIVE_SIZE: usize = 100 * 1024 * 1024;
/// Maximum size of one fetched script asset in bytes (1 MB).
pub const MAX_ASSET_SIZE: usize = 1024 * 1024;

/// Per-asset deadline when external script fetching is enabled.
pub const ASSET_FETCH_TIMEOUT: Duration = Duration::from_secs(5);
/// Maximum JSON body size accepted by the `/analyze` endpoint (5 MB).
pub const MAX_ANALYZE_REQUEST_SIZE: usize = 5 * 1024 * 1024;

/// Default User-Agent string for HTTP requests.
///
/// Users can override this via `EngineConfig::user_agent`.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Canonical URL of the upstream Wappalyzer browser-extension archive.
///
/// The XPI is a plain ZIP file containing `technologies/*.json` and
/// `categories.json`.
pub const WAPPALYZER_ARCHIVE_URL: &str =
    "https://addons.mozilla.org/firefox/downloads/latest/wappalyzer/platform:2/wappalyzer.xpi";

/// Public DNS resolvers queried in rotation: Google, Cloudflare, Quad9, OpenDNS.
pub const PUBLIC_DNS_RESOLVERS: [&str; 4] = ["8.8.8.8", "1.1.1.1", "9.9.9.9", "208.67.222.222"];

/// Default port for the HTTP analysis server (overridden by `PORT`).
pub const DEFAULT_SERVER_PORT: u16 = 8080;
