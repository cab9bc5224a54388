// Offline pipeline properties: determinism, the zero-invalid invariant, and
// end-to-end archive → database → engine flow.

use std::io::{Cursor, Write};

use techscope::pipeline::{lint, normalize, Fingerprints};
use techscope::{Engine, EngineConfig, FingerprintRuleset};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

const RAW_TECHNOLOGIES: &str = r#"{
    "WordPress": {
        "cats": [1, 11],
        "website": "https://wordpress.org",
        "meta": {"generator": "^WordPress(?: ([\\d.]+))?\\;version:\\1"},
        "scriptSrc": "/wp-(?:content|includes)/",
        "html": "<link[^>]+/wp-content/",
        "implies": ["PHP", "MySQL"]
    },
    "PHP": {
        "cats": [27],
        "headers": {"X-Powered-By": "^PHP(?:/([\\d.]+))?\\;version:\\1"}
    },
    "MySQL": {"cats": [34]},
    "Sloppy": {
        "html": ["div", ".*", "(?!lookahead)marker-token", "broken(pattern"],
        "dom": {"div": {"exists": ""}, "div.custom-wp": {"exists": ""}}
    }
}"#;

fn raw_map() -> serde_json::Map<String, serde_json::Value> {
    serde_json::from_str(RAW_TECHNOLOGIES).expect("raw fixture parses")
}

/// Given the same input, the pipeline produces byte-identical output with
/// sorted keys.
#[test]
fn test_pipeline_determinism() {
    let first = serde_json::to_string_pretty(&normalize(&raw_map())).expect("serialize");
    let second = serde_json::to_string_pretty(&normalize(&raw_map())).expect("serialize");
    assert_eq!(first, second);

    let mysql = first.find("\"MySQL\"").expect("MySQL present");
    let wordpress = first.find("\"WordPress\"").expect("WordPress present");
    assert!(mysql < wordpress, "apps serialize in sorted order");
}

/// Every regex in the emitted database compiles under the runtime dialect
/// with the case-insensitive flag.
#[test]
fn test_zero_invalid_invariant() {
    let fingerprints = normalize(&raw_map());
    lint(&fingerprints).expect("lint passes on normalized output");

    // The invariant holds after a serialization round-trip as well.
    let json = serde_json::to_string(&fingerprints).expect("serialize");
    let reloaded: Fingerprints = serde_json::from_str(&json).expect("deserialize");
    lint(&reloaded).expect("lint passes after round-trip");
}

/// Quality gates drop the low-signal patterns; the cleaned survivors keep
/// their meaning.
#[test]
fn test_quality_gates_applied() {
    let fingerprints = normalize(&raw_map());
    let sloppy = fingerprints.apps.get("Sloppy").expect("Sloppy normalized");

    // "div" (denylist), ".*" (trivial), and "broken(pattern" (unbalanced) are
    // gone; the lookahead was stripped from the surviving pattern.
    assert_eq!(sloppy.html.len(), 1);
    let survivor = regex::Regex::new(&sloppy.html[0].regex).expect("survivor compiles");
    assert!(survivor.is_match("marker-token"));
    assert!(!sloppy.html[0].regex.contains("(?!"));

    // DOM: the generic "div" selector is rejected, the specific one survives.
    assert_eq!(sloppy.dom.len(), 1);
    assert_eq!(sloppy.dom[0].regex, "div.custom-wp");
}

/// Version templates survive normalization and drive extraction at runtime.
#[tokio::test]
async fn test_normalized_database_drives_the_engine() {
    let fingerprints = normalize(&raw_map());
    lint(&fingerprints).expect("lint passes");
    let json = serde_json::to_string_pretty(&fingerprints).expect("serialize");

    let engine = Engine::from_fingerprints(&json, "{}", EngineConfig::default())
        .expect("engine builds from pipeline output");

    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert("x-powered-by", "PHP/8.2.1".parse().expect("header value"));
    let body = br#"<html><head>
        <meta name="generator" content="WordPress 6.4.2">
        </head><body></body></html>"#;

    let detected = engine.fingerprint(&headers, body);

    let php = detected.get("PHP").expect("PHP detected");
    assert_eq!(php.version, "8.2.1");
    assert_eq!(php.detected_by, "header:X-Powered-By");

    let wordpress = detected.get("WordPress").expect("WordPress detected");
    assert_eq!(wordpress.version, "6.4.2");

    // WordPress arrived via a medium-confidence meta match, so its
    // implications stay out; PHP's high-confidence header match has none.
    assert!(!detected.contains_key("MySQL"));
}

/// The archive extractor, normalizer, and linter compose: a synthetic XPI
/// flows through to files an engine can load.
#[test]
fn test_archive_to_database_files() {
    // Build a synthetic extension archive in memory.
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    writer
        .start_file("technologies/w.json", SimpleFileOptions::default())
        .expect("start entry");
    writer
        .write_all(RAW_TECHNOLOGIES.as_bytes())
        .expect("write entry");
    writer
        .start_file("categories.json", SimpleFileOptions::default())
        .expect("start entry");
    writer
        .write_all(br#"{"1": {"name": "CMS", "priority": 9}, "27": {"name": "Programming languages", "priority": 5}}"#)
        .expect("write entry");
    let archive = writer.finish().expect("finish archive").into_inner();

    let (raw_apps, categories) =
        techscope::pipeline::extract_archive(&archive).expect("extract succeeds");
    assert_eq!(raw_apps.len(), 4);

    let fingerprints = normalize(&raw_apps);
    lint(&fingerprints).expect("lint passes");

    let dir = tempfile::tempdir().expect("tempdir");
    let fp_path = dir.path().join("fingerprints_data.json");
    let cat_path = dir.path().join("categories_data.json");
    std::fs::write(
        &fp_path,
        serde_json::to_string_pretty(&fingerprints).expect("serialize"),
    )
    .expect("write fingerprints");
    std::fs::write(&cat_path, String::from_utf8_lossy(&categories).as_bytes())
        .expect("write categories");

    let ruleset = FingerprintRuleset::from_json(
        &std::fs::read_to_string(&fp_path).expect("read fingerprints"),
        &std::fs::read_to_string(&cat_path).expect("read categories"),
    )
    .expect("ruleset loads from files");
    assert!(ruleset.apps.contains_key("WordPress"));
    assert_eq!(ruleset.category_names(&[1]), vec!["CMS".to_string()]);
}
