//! Structured logging bootstrap.
//!
//! Independent of the user-facing `STANDARD`/`TAP`/`SUBUNIT`/`XML` result
//! streams in [`crate::output`]: this is diagnostic noise for whoever is
//! staring at the test binary's stderr, gated by `RUST_LOG` the usual way.

use std::sync::Once;

static INIT: Once = Once::new();

/// Installs a `tracing-subscriber` `fmt` subscriber once per process.
/// Safe to call from every test group's entry point; later calls are no-ops.
pub fn init() {
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .try_init()
            .ok();
    });
}
