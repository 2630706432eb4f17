//! Diagnostic logging setup.
//!
//! Stage summaries meant for the user are printed to stdout by [`crate::output`].
//! Everything else (per-folder progress, skipped files, recoverable errors)
//! goes through `tracing` to stderr.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Install the global subscriber.
///
/// `RUST_LOG` wins when set. Otherwise the crate logs at `info`, or at `debug`
/// with `verbose`, and dependencies only at `warn`.
pub fn init(verbose: bool, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(verbose));

    let registry = tracing_subscriber::registry().with(filter);
    let result = if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .without_time()
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };

    // Already installed (e.g. by a test harness); keep the existing one.
    if let Err(e) = result {
        tracing::debug!("logging already initialized: {e}");
    }
}

fn default_filter(verbose: bool) -> EnvFilter {
    let level = if verbose { "debug" } else { "info" };
    EnvFilter::new(format!("warn,gallery_forge={level}"))
}
