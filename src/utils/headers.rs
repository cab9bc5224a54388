//! HTTP header name utilities.

/// Canonicalizes an HTTP header name for display: each dash-separated segment
/// gets an uppercase first letter (`x-powered-by` → `X-Powered-By`).
///
/// The HTTP layer stores header names lower-cased; provenance strings in
/// detection results use the canonical form.
pub(crate) fn canonical_header_name(name: &str) -> String {
    name.split('-')
        .map(|segment| {
            let mut chars = segment.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}
