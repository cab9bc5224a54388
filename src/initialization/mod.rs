//! Engine resource initialization.
//!
//! This module provides functions to initialize shared resources: the HTTP
//! client (with the issuer-capturing TLS configuration), the logger, and the
//! rustls crypto provider.

mod client;
mod logger;

use rustls::crypto::{ring::default_provider, CryptoProvider};

pub use client::init_client;
pub use logger::init_logger_with;

/// Initializes the crypto provider for TLS operations.
///
/// Configures the global crypto provider for `rustls`. This must be called
/// before any TLS configuration is built. The return value is ignored because
/// reinstalling the provider is harmless.
pub fn init_crypto_provider() {
    let _ = CryptoProvider::install_default(default_provider());
}
