//! Logging setup for the alertdash engine.
//!
//! Logs to stderr with an env-derived filter.

use std::sync::OnceLock;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static INIT: OnceLock<()> = OnceLock::new();

/// Initialize the tracing subscriber.
///
/// Safe to call any number of times; only the first call installs the
/// subscriber. Filter defaults to `info` with debug output for the
/// engine's own crates, overridable via `RUST_LOG`.
pub fn init_logging() {
    INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("info,alertdash_engine=debug,alertdash_core=debug"));

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_init_does_not_panic() {
        init_logging();
        init_logging();
    }
}
