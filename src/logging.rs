//! Logging setup.
//!
//! Diagnostics go to stderr through a `tracing-subscriber` fmt layer so they
//! never mix with records written to stdout. `RUST_LOG` overrides the
//! default level.

use tracing_subscriber::EnvFilter;

/// Install the global subscriber. `default_level` applies when `RUST_LOG`
/// is unset or invalid.
pub fn init(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // A second initialisation (e.g. from tests) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
