//! Category table parsing and resolution.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::pipeline::types::Category;

/// Category information for one detected technology: the raw IDs from its
/// fingerprint and the names that resolved against the category table.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryInfo {
    /// Category IDs as recorded in the fingerprint
    pub ids: Vec<i64>,
    /// Resolved human-readable names (missing IDs are skipped)
    pub names: Vec<String>,
}

/// Parses the category table: `{ "<id>": { "name": ..., "priority": ... } }`.
/// Keys that do not parse as integers are skipped.
pub(crate) fn parse_categories(data: &str) -> Result<BTreeMap<i64, String>, serde_json::Error> {
    let raw: BTreeMap<String, Category> = serde_json::from_str(data)?;
    Ok(raw
        .into_iter()
        .filter_map(|(id, category)| id.parse::<i64>().ok().map(|id| (id, category.name)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_categories_basic() {
        let table = parse_categories(
            r#"{"1": {"name": "CMS", "priority": "9"}, "22": {"name": "Web servers", "priority": 8}}"#,
        )
        .expect("categories parse");
        assert_eq!(table.get(&1).map(String::as_str), Some("CMS"));
        assert_eq!(table.get(&22).map(String::as_str), Some("Web servers"));
    }

    #[test]
    fn test_parse_categories_skips_non_numeric_keys() {
        let table = parse_categories(r#"{"oops": {"name": "Broken", "priority": "1"}}"#)
            .expect("categories parse");
        assert!(table.is_empty());
    }
}
