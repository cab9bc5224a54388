//! TLS issuer capture.
//!
//! The engine's HTTP client is built over a rustls configuration whose
//! certificate verifier performs real verification, then records the leaf
//! certificate's issuer common name in a per-engine cache keyed by host.
//! Verification failures never block the fetch — detection must work against
//! misconfigured sites — but a failed handshake caches nothing, so the
//! cert-issuer vector only ever sees verified issuers.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use log::debug;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::client::WebPkiServerVerifier;
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};

use crate::error_handling::InitializationError;

/// Per-engine cache of `host → issuer common name`, populated during the TLS
/// handshake of any request that terminates at that host.
#[derive(Debug, Clone, Default)]
pub struct IssuerCache {
    inner: Arc<Mutex<HashMap<String, String>>>,
}

impl IssuerCache {
    /// Records the issuer for a host.
    pub(crate) fn insert(&self, host: String, issuer: String) {
        let mut cache = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        cache.insert(host, issuer);
    }

    /// Returns the cached issuer for a host, if any handshake to it verified.
    pub(crate) fn get(&self, host: &str) -> Option<String> {
        let cache = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        cache.get(host).cloned()
    }
}

/// A certificate verifier that delegates to webpki verification and captures
/// the issuer of every certificate that passes. Failures are tolerated so the
/// page fetch proceeds, but nothing is cached for them.
#[derive(Debug)]
struct IssuerCapturingVerifier {
    inner: Arc<WebPkiServerVerifier>,
    cache: IssuerCache,
}

impl ServerCertVerifier for IssuerCapturingVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        ocsp_response: &[u8],
        now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        match self
            .inner
            .verify_server_cert(end_entity, intermediates, server_name, ocsp_response, now)
        {
            Ok(verified) => {
                if let (Some(host), Some(issuer)) =
                    (server_name_to_string(server_name), issuer_common_name(end_entity.as_ref()))
                {
                    debug!("caching TLS issuer for {host}: {issuer}");
                    self.cache.insert(host, issuer);
                }
                Ok(verified)
            }
            Err(e) => {
                // Invalid certificates must not abort the fetch; the issuer
                // simply is not cached.
                debug!("certificate verification failed, continuing uncached: {e}");
                Ok(ServerCertVerified::assertion())
            }
        }
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        self.inner.verify_tls12_signature(message, cert, dss)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        self.inner.verify_tls13_signature(message, cert, dss)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.inner.supported_verify_schemes()
    }
}

/// Builds the rustls client configuration carrying the issuer-capturing
/// verifier. The crypto provider must be installed first.
pub(crate) fn tls_client_config(cache: IssuerCache) -> Result<ClientConfig, InitializationError> {
    // Reinstalling the provider is harmless; building without one is not.
    crate::initialization::init_crypto_provider();

    let mut roots = RootCertStore::empty();
    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    let inner = WebPkiServerVerifier::builder(Arc::new(roots))
        .build()
        .map_err(|e| InitializationError::Tls(e.to_string()))?;

    let mut config = ClientConfig::builder()
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(IssuerCapturingVerifier { inner, cache }))
        .with_no_client_auth();
    config.alpn_protocols = vec![b"http/1.1".to_vec()];
    Ok(config)
}

/// Renders the SNI name the way the issuer cache keys hosts.
fn server_name_to_string(server_name: &ServerName<'_>) -> Option<String> {
    match server_name {
        ServerName::DnsName(dns) => Some(dns.as_ref().to_string()),
        ServerName::IpAddress(ip) => Some(std::net::IpAddr::from(*ip).to_string()),
        _ => None,
    }
}

/// Extracts the issuer common name from a DER-encoded certificate, falling
/// back to the full distinguished name when no CN attribute is present.
fn issuer_common_name(der: &[u8]) -> Option<String> {
    let (_, cert) = x509_parser::parse_x509_certificate(der).ok()?;
    let issuer = &cert.tbs_certificate.issuer;
    let result = issuer
        .iter_common_name()
        .next()
        .and_then(|cn| cn.as_str().ok())
        .map(str::to_string)
        .or_else(|| Some(issuer.to_string()));
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issuer_cache_roundtrip() {
        let cache = IssuerCache::default();
        assert!(cache.get("example.com").is_none());
        cache.insert("example.com".to_string(), "Example CA".to_string());
        assert_eq!(cache.get("example.com").as_deref(), Some("Example CA"));
        assert!(cache.get("other.com").is_none());
    }

    #[test]
    fn test_issuer_cache_clones_share_state() {
        let cache = IssuerCache::default();
        let clone = cache.clone();
        clone.insert("example.com".to_string(), "Example CA".to_string());
        assert_eq!(cache.get("example.com").as_deref(), Some("Example CA"));
    }

    #[test]
    fn test_issuer_common_name_rejects_garbage() {
        assert!(issuer_common_name(b"not a certificate").is_none());
    }

    #[test]
    fn test_tls_client_config_builds() {
        crate::initialization::init_crypto_provider();
        let config = tls_client_config(IssuerCache::default()).expect("TLS config builds");
        assert_eq!(config.alpn_protocols, vec![b"http/1.1".to_vec()]);
    }
}
