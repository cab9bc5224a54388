// Shared test helpers for engine construction and mock page serving.
//
// This module provides common utilities used across multiple test files to
// reduce duplication.

use techscope::{Engine, EngineConfig};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Builds an engine over a caller-supplied fingerprint database with an
/// empty category table.
#[allow(dead_code)] // Used by other test files
pub fn engine_with(fingerprints_json: &str) -> Engine {
    Engine::from_fingerprints(fingerprints_json, "{}", EngineConfig::default())
        .expect("Failed to build test engine")
}

/// Starts a mock server responding to `GET /` with the given response.
/// Unmatched paths (including `/robots.txt`) return 404, which the engine
/// treats as "no robots content" without error.
#[allow(dead_code)]
pub async fn serve_page(response: ResponseTemplate) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(response)
        .mount(&server)
        .await;
    server
}

/// Starts a mock server with both a main page and a robots.txt response.
#[allow(dead_code)]
pub async fn serve_page_with_robots(
    page: ResponseTemplate,
    robots: ResponseTemplate,
) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(page)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(robots)
        .mount(&server)
        .await;
    server
}
