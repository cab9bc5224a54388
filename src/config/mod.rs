//! Engine configuration and constants.
//!
//! This module provides:
//! - Configuration constants (timeouts, size caps, resolver addresses)
//! - Configuration types (library-only, no CLI dependencies)

mod constants;
mod types;

// Re-export all constants
pub use constants::*;
pub use types::{EngineConfig, LogLevel};
