//! Error type definitions.

use std::fmt;

use thiserror::Error;

/// Error types for engine construction failures.
#[derive(Error, Debug)]
pub enum InitializationError {
    /// The embedded or supplied fingerprint database failed to load or parse.
    #[error("fingerprint database error: {0}")]
    Database(String),

    /// The category table failed to load or parse.
    #[error("category table error: {0}")]
    Categories(String),

    /// Error building the HTTP client.
    #[error("HTTP client initialization error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// Error building the TLS configuration for the issuer-capturing verifier.
    #[error("TLS configuration error: {0}")]
    Tls(String),
}

/// Error types for the offline fingerprint pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The upstream archive could not be downloaded.
    #[error("failed to download fingerprint archive: {0}")]
    Download(String),

    /// The downloaded archive could not be read as a ZIP file.
    #[error("failed to read archive: {0}")]
    Archive(String),

    /// The archive contained no `technologies/*.json` entries.
    #[error("no technologies were found in the archive")]
    NoTechnologies,

    /// The archive did not contain `categories.json`.
    #[error("categories.json was not found in the archive")]
    MissingCategories,

    /// The lint stage found patterns the runtime engine would reject.
    /// The database is never emitted with an invalid pattern.
    #[error("{count} invalid regex patterns found:\n{details}")]
    InvalidPatterns {
        /// Number of patterns that failed to compile
        count: usize,
        /// One line per failure, naming the app and field
        details: String,
    },

    /// Serialization of the normalized database failed.
    #[error("failed to serialize fingerprint database: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Filesystem error writing the output files.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Aggregated errors from the concurrent data-gathering stage of one analysis.
///
/// Each field corresponds to one gathering task. The analysis is fatal iff the
/// main page fetch or the DNS step failed; a robots.txt failure is surfaced
/// but analysis proceeds. Callers can inspect the structured form to decide
/// severity.
#[derive(Debug, Default)]
pub struct AnalysisError {
    /// Main page fetch failure (fatal)
    pub main_page: Option<anyhow::Error>,
    /// robots.txt fetch failure (non-fatal)
    pub robots: Option<anyhow::Error>,
    /// DNS failure: every record type errored (fatal)
    pub dns: Option<anyhow::Error>,
}

impl AnalysisError {
    /// Returns true if a critical error occurred that stops the analysis.
    pub fn is_fatal(&self) -> bool {
        self.main_page.is_some() || self.dns.is_some()
    }

    /// Returns true if no task reported an error.
    pub fn is_empty(&self) -> bool {
        self.main_page.is_none() && self.robots.is_none() && self.dns.is_none()
    }
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut errs = Vec::new();
        if let Some(e) = &self.main_page {
            errs.push(format!("main page fetch failed: {e}"));
        }
        if let Some(e) = &self.dns {
            errs.push(format!("dns lookup failed: {e}"));
        }
        if let Some(e) = &self.robots {
            errs.push(format!("robots.txt fetch failed: {e}"));
        }
        if errs.is_empty() {
            return Ok(());
        }
        write!(f, "analysis failed: {}", errs.join("; "))
    }
}

impl std::error::Error for AnalysisError {}
