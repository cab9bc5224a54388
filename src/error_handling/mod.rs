//! Error types and aggregation.
//!
//! This module defines the typed errors raised by the engine and the offline
//! pipeline, plus the composite error that aggregates the per-task failures
//! of one analysis request.

mod types;

pub use types::{AnalysisError, InitializationError, PipelineError};
