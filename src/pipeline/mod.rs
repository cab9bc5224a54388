//! Offline fingerprint pipeline.
//!
//! Converts the upstream Wappalyzer browser-extension archive into a strict,
//! pre-validated pattern database:
//!
//! 1. **Fetch** — download the archive and extract `technologies/*.json` and
//!    `categories.json` in memory.
//! 2. **Normalize** — coerce the loose upstream schema into the strict schema,
//!    parse the pattern DSL, sanitize regexes through an AST rewrite, and
//!    apply quality gates.
//! 3. **Lint** — compile every surviving pattern the way the runtime will;
//!    any failure aborts the pipeline.
//!
//! The output is two JSON documents with sorted keys: the fingerprint
//! database and the category table. Given the same input archive the output
//! is byte-identical.

mod fetch;
mod lint;
mod normalize;
pub mod types;

use std::path::Path;

use log::info;

use crate::error_handling::PipelineError;

pub use fetch::{extract_archive, fetch_archive};
pub use lint::lint;
pub use normalize::normalize;
pub use types::{Fingerprint, Fingerprints, ParsedPattern};

/// Runs the full pipeline and writes the two database files.
///
/// # Arguments
///
/// * `fingerprints_path` - Output path for the fingerprint database
/// * `categories_path` - Output path for the category table
///
/// # Errors
///
/// Returns a [`PipelineError`] if the archive cannot be fetched, contains no
/// technology definitions, or any normalized pattern fails the lint stage.
pub async fn update_fingerprints(
    fingerprints_path: &Path,
    categories_path: &Path,
) -> Result<(), PipelineError> {
    let (raw_apps, categories_data) = fetch_archive().await?;
    info!("Fetched {} raw technology definitions", raw_apps.len());

    let fingerprints = normalize(&raw_apps);
    info!(
        "Normalized {} technologies into the strict schema",
        fingerprints.apps.len()
    );

    lint(&fingerprints)?;
    info!("Lint passed: every pattern compiles under the runtime dialect");

    let fp_json = serde_json::to_string_pretty(&fingerprints)?;
    std::fs::write(fingerprints_path, fp_json)?;

    let categories_json = normalize::normalize_categories(&categories_data)?;
    std::fs::write(categories_path, categories_json)?;

    info!(
        "Wrote {} and {}",
        fingerprints_path.display(),
        categories_path.display()
    );
    Ok(())
}
