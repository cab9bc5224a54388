//! HTTP client initialization.

use std::time::Duration;

use reqwest::ClientBuilder;

use crate::config::EngineConfig;
use crate::error_handling::InitializationError;
use crate::tls::IssuerCache;

/// Initializes the analysis HTTP client.
///
/// Creates a `reqwest::Client` configured with:
/// - User-Agent header from the engine configuration
/// - Request timeout from the engine configuration
/// - Redirect following enabled (reqwest default, up to 10 hops)
/// - The issuer-capturing rustls TLS configuration, so every successful
///   handshake records the certificate issuer in the engine's cache
///
/// # Errors
///
/// Returns an error if the TLS configuration or client creation fails.
pub fn init_client(
    config: &EngineConfig,
    issuer_cache: IssuerCache,
) -> Result<reqwest::Client, InitializationError> {
    let tls = crate::tls::tls_client_config(issuer_cache)?;
    let client = ClientBuilder::new()
        .timeout(config.request_timeout)
        .connect_timeout(Duration::from_secs(5))
        .user_agent(config.user_agent.clone())
        .use_preconfigured_tls(tls)
        .build()?;
    Ok(client)
}
