//! Diagnostic logging to stderr.
//!
//! Filter comes from `TRACEMARK_LOG` (`EnvFilter` syntax), defaulting to
//! `warn`, or `info` in verbose mode. User-facing output does not go through
//! here; this is for tracing what the recorder did.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Env var holding the log filter.
pub const LOG_ENV: &str = "TRACEMARK_LOG";

/// Install the global subscriber. Later calls are no-ops.
pub fn init(verbose: bool) {
    let default_level = if verbose {
        LevelFilter::INFO
    } else {
        LevelFilter::WARN
    };
    let filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .with_env_var(LOG_ENV)
        .from_env_lossy();

    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time();

    // Fails only if a subscriber is already set.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init();
}
