//! Logger initialization.

use log::LevelFilter;

/// Initializes the logger with the specified level.
///
/// The logger reads from the `RUST_LOG` environment variable by default, but
/// the provided `level` parameter overrides it. Noisy third-party modules are
/// filtered down so debug runs stay readable.
///
/// Safe to call more than once; subsequent calls are no-ops.
pub fn init_logger_with(level: LevelFilter) {
    let mut builder = env_logger::Builder::from_default_env();
    builder.filter_level(level);
    builder.filter_module("html5ever", LevelFilter::Error);
    builder.filter_module("selectors", LevelFilter::Warn);
    builder.filter_module("reqwest", LevelFilter::Info);
    builder.filter_module("hyper", LevelFilter::Info);
    // Suppress hickory warnings about malformed DNS responses; they are
    // expected from public resolvers and handled gracefully.
    builder.filter_module("hickory_proto", LevelFilter::Error);
    builder.filter_module("techscope", level);
    let _ = builder.try_init();
}
