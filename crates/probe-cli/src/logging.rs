//! Tracing subscriber setup

use crate::config::Verbosity;
use tracing_subscriber::EnvFilter;

/// Filter from `RUST_LOG`, else the verbosity default
#[must_use]
pub fn filter(verbosity: Verbosity) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(verbosity.log_filter()))
}

/// Install the global subscriber on stderr.
///
/// Debug verbosity adds targets and thread ids. A second call is a no-op.
pub fn init(verbosity: Verbosity) {
    let debug = matches!(verbosity, Verbosity::Debug);
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter(verbosity))
        .with_writer(std::io::stderr)
        .with_target(debug)
        .with_thread_ids(debug)
        .try_init();
}
