//! Configuration types.
//!
//! This module defines the engine configuration struct and the CLI-facing
//! log level enum.

use std::time::Duration;

use clap::ValueEnum;

use crate::config::constants::{DEFAULT_USER_AGENT, REGEX_TIMEOUT, REQUEST_TIMEOUT};

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Engine configuration.
///
/// Constructed programmatically; every field has a sensible default.
///
/// # Examples
///
/// ```no_run
/// use techscope::EngineConfig;
/// use std::time::Duration;
///
/// let config = EngineConfig {
///     request_timeout: Duration::from_secs(15),
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Shared deadline for one analysis request
    pub request_timeout: Duration,

    /// Upper bound for a single regex execution
    pub regex_timeout: Duration,

    /// HTTP User-Agent header value
    pub user_agent: String,

    /// How many external `<script src>` targets to download and feed into
    /// the script and JS-property vectors. Zero disables asset fetching;
    /// most fingerprints trigger on the source URL alone.
    pub max_external_scripts: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            request_timeout: REQUEST_TIMEOUT,
            regex_timeout: REGEX_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_external_scripts: 0,
        }
    }
}
