//! techscope: web technology fingerprinting.
//!
//! Given a URL, the engine performs coordinated network probes — the page
//! itself, `/robots.txt`, DNS records, and the TLS handshake — and matches
//! the evidence against a pre-validated pattern database across thirteen
//! detection vectors, returning detected technologies with optional versions,
//! categories, and an audit trail describing how each was found.
//!
//! The pattern database is produced offline by the [`pipeline`] module, which
//! downloads the upstream Wappalyzer extension archive, normalizes its loose
//! schema, sanitizes every regex through an AST rewrite, and refuses to emit
//! a database containing any pattern the runtime would reject. Both database
//! files are embedded into the binary, so analysis needs no filesystem.
//!
//! # Example
//!
//! ```no_run
//! use techscope::Engine;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = Engine::new()?;
//! let analysis = engine.analyze("https://example.com").await?;
//! for (name, detection) in &analysis.technologies {
//!     println!("{name} ({}) via {}", detection.version, detection.detected_by);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! [`Engine::analyze`] requires a Tokio runtime. Use `#[tokio::main]` in your
//! application or call it from within an async context.

#![warn(missing_docs)]

mod analysis;
pub mod config;
mod dns;
mod engine;
mod error_handling;
mod gather;
mod initialization;
mod matcher;
mod page;
pub mod pipeline;
mod ruleset;
pub mod server;
mod tls;
mod utils;

// Re-export public API
pub use analysis::{Confidence, DetectedMap, Detection};
pub use config::{EngineConfig, LogLevel};
pub use engine::{Analysis, Engine};
pub use error_handling::{AnalysisError, InitializationError, PipelineError};
pub use initialization::{init_crypto_provider, init_logger_with};
pub use ruleset::{CategoryInfo, FingerprintRuleset};
