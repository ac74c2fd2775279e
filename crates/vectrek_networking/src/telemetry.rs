//! # Telemetry Bootstrap
//!
//! Installs the process-wide `tracing` subscriber for the binaries. Library
//! code only emits events and never installs anything itself.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Installs a console subscriber filtered by `level`.
///
/// `RUST_LOG` takes precedence when set. An unparsable directive falls back
/// to `info`. Calling this twice is harmless; the second call is ignored.
pub fn init(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .try_init();
    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
