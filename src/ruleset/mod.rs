//! Fingerprint database loading.
//!
//! Both database files produced by the offline pipeline are embedded into the
//! binary, so analysis has no runtime filesystem dependency. Fingerprints are
//! loaded once at engine construction and are read-only thereafter.

mod categories;

use std::collections::BTreeMap;

use crate::error_handling::InitializationError;
use crate::pipeline::types::{Fingerprint, Fingerprints};

pub use categories::CategoryInfo;
pub(crate) use categories::parse_categories;

/// Embedded fingerprint database, produced by `update-fingerprints`.
const EMBEDDED_FINGERPRINTS: &str = include_str!("../../assets/fingerprints_data.json");

/// Embedded category table.
const EMBEDDED_CATEGORIES: &str = include_str!("../../assets/categories_data.json");

/// The loaded fingerprint database plus the category table.
#[derive(Debug, Clone)]
pub struct FingerprintRuleset {
    /// Technologies keyed by name
    pub apps: BTreeMap<String, Fingerprint>,
    /// Category ID → human-readable name
    pub categories: BTreeMap<i64, String>,
}

impl FingerprintRuleset {
    /// Loads the embedded database and category table.
    pub fn embedded() -> Result<Self, InitializationError> {
        Self::from_json(EMBEDDED_FINGERPRINTS, EMBEDDED_CATEGORIES)
    }

    /// Builds a ruleset from caller-supplied JSON documents. Used by tests
    /// and by tooling that works against a freshly built database.
    pub fn from_json(fingerprints: &str, categories: &str) -> Result<Self, InitializationError> {
        let parsed: Fingerprints = serde_json::from_str(fingerprints)
            .map_err(|e| InitializationError::Database(e.to_string()))?;
        let categories = parse_categories(categories)
            .map_err(|e| InitializationError::Categories(e.to_string()))?;
        Ok(Self {
            apps: parsed.apps,
            categories,
        })
    }

    /// Returns the category names for a list of category IDs. IDs missing
    /// from the table map to no name.
    pub fn category_names(&self, ids: &[i64]) -> Vec<String> {
        ids.iter()
            .filter_map(|id| self.categories.get(id).cloned())
            .collect()
    }
}
