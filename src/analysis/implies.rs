//! The implies engine.
//!
//! Breadth-first closure over `implies` edges, run once all matchers have
//! completed. Only technologies detected with high confidence propagate
//! their implications; implied technologies are recorded at medium
//! confidence. Each technology is processed exactly once, so cycles in the
//! implies graph terminate in a single pass. Names without a database entry
//! are ignored.

use std::collections::{BTreeMap, HashSet, VecDeque};

use crate::pipeline::types::Fingerprint;

use super::{Confidence, DetectedMap, Detection};

/// Resolves implied technologies into the detected map.
pub(crate) fn run_implies_engine(
    apps: &BTreeMap<String, Fingerprint>,
    detected: &mut DetectedMap,
) {
    let mut queue: VecDeque<String> = detected.keys().cloned().collect();
    let mut processed: HashSet<String> = HashSet::new();

    while let Some(name) = queue.pop_front() {
        if !processed.insert(name.clone()) {
            continue;
        }

        // Only high-confidence detections propagate implications.
        let Some(source) = detected.get(&name) else {
            continue;
        };
        if source.confidence < Confidence::High {
            continue;
        }

        let Some(app) = apps.get(&name) else {
            continue;
        };
        for implied in &app.implies {
            if detected.contains_key(implied) {
                continue;
            }
            detected.insert(
                implied.clone(),
                Detection {
                    version: String::new(),
                    detected_by: format!("implies from: {name}"),
                    matched_pattern: String::new(),
                    matched_value: String::new(),
                    confidence: Confidence::Medium,
                },
            );
            queue.push_back(implied.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app_with_implies(implies: &[&str]) -> Fingerprint {
        Fingerprint {
            implies: implies.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    fn detection(detected_by: &str, confidence: Confidence) -> Detection {
        Detection {
            version: String::new(),
            detected_by: detected_by.to_string(),
            matched_pattern: String::new(),
            matched_value: String::new(),
            confidence,
        }
    }

    #[test]
    fn test_high_confidence_propagates() {
        let apps: BTreeMap<String, Fingerprint> =
            [("WordPress".to_string(), app_with_implies(&["PHP"]))]
                .into_iter()
                .collect();
        let mut detected: DetectedMap =
            [("WordPress".to_string(), detection("header:X-Powered-By", Confidence::High))]
                .into_iter()
                .collect();

        run_implies_engine(&apps, &mut detected);

        let php = detected.get("PHP").expect("PHP implied");
        assert_eq!(php.detected_by, "implies from: WordPress");
        assert_eq!(php.confidence, Confidence::Medium);
    }

    #[test]
    fn test_low_confidence_does_not_propagate() {
        let apps: BTreeMap<String, Fingerprint> =
            [("WordPress".to_string(), app_with_implies(&["PHP"]))]
                .into_iter()
                .collect();
        let mut detected: DetectedMap =
            [("WordPress".to_string(), detection("html", Confidence::Low))]
                .into_iter()
                .collect();

        run_implies_engine(&apps, &mut detected);
        assert!(!detected.contains_key("PHP"));
    }

    #[test]
    fn test_implied_detection_does_not_propagate_further() {
        // A implies B, B implies C. B arrives at medium confidence, so C is
        // never added.
        let apps: BTreeMap<String, Fingerprint> = [
            ("A".to_string(), app_with_implies(&["B"])),
            ("B".to_string(), app_with_implies(&["C"])),
        ]
        .into_iter()
        .collect();
        let mut detected: DetectedMap =
            [("A".to_string(), detection("cookie:a_session", Confidence::High))]
                .into_iter()
                .collect();

        run_implies_engine(&apps, &mut detected);
        assert!(detected.contains_key("B"));
        assert!(!detected.contains_key("C"));
    }

    #[test]
    fn test_cycles_terminate() {
        let apps: BTreeMap<String, Fingerprint> = [
            ("A".to_string(), app_with_implies(&["B"])),
            ("B".to_string(), app_with_implies(&["A"])),
        ]
        .into_iter()
        .collect();
        let mut detected: DetectedMap =
            [("A".to_string(), detection("dns:TXT", Confidence::High))]
                .into_iter()
                .collect();

        run_implies_engine(&apps, &mut detected);
        assert!(detected.contains_key("B"));
        assert_eq!(detected.len(), 2);
    }

    #[test]
    fn test_existing_detection_not_overwritten() {
        let apps: BTreeMap<String, Fingerprint> =
            [("WordPress".to_string(), app_with_implies(&["PHP"]))]
                .into_iter()
                .collect();
        let mut detected: DetectedMap = [
            ("WordPress".to_string(), detection("header:Server", Confidence::High)),
            ("PHP".to_string(), detection("header:X-Powered-By", Confidence::High)),
        ]
        .into_iter()
        .collect();

        run_implies_engine(&apps, &mut detected);
        assert_eq!(detected["PHP"].detected_by, "header:X-Powered-By");
    }

    #[test]
    fn test_unknown_implied_name_is_recorded_but_inert() {
        let apps: BTreeMap<String, Fingerprint> =
            [("A".to_string(), app_with_implies(&["NotInDatabase"]))]
                .into_iter()
                .collect();
        let mut detected: DetectedMap =
            [("A".to_string(), detection("dns:NS", Confidence::High))]
                .into_iter()
                .collect();

        run_implies_engine(&apps, &mut detected);
        assert!(detected.contains_key("NotInDatabase"));
    }
}
