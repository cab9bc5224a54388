//! Bounded regex execution.
//!
//! Every regex execution runs on a detached worker thread while the caller
//! waits at most the configured budget. On timeout the match is treated as a
//! non-match and the runaway execution runs to its own end. Patterns are
//! statically validated offline; this is the runtime line of defense against
//! pathological inputs.

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use regex::Regex;

/// Runs `re` against `input` with a timeout.
///
/// Returns the capture list (index 0 is the full match, unmatched groups are
/// `None`) or `None` if the regex did not match or the budget was exceeded.
pub(crate) fn match_with_timeout(
    re: &Regex,
    input: &str,
    timeout: Duration,
) -> Option<Vec<Option<String>>> {
    // Regex clones share the compiled program; the input copy is the price of
    // letting the worker outlive a timed-out call.
    let re = re.clone();
    let haystack = input.to_owned();
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        let result = re.captures(&haystack).map(|caps| {
            (0..caps.len())
                .map(|i| caps.get(i).map(|m| m.as_str().to_string()))
                .collect::<Vec<_>>()
        });
        // The receiver may be gone if the caller timed out.
        let _ = tx.send(result);
    });

    match rx.recv_timeout(timeout) {
        Ok(result) => result,
        Err(_) => {
            log::debug!("regex execution exceeded {timeout:?}, treating as no match");
            None
        }
    }
}
