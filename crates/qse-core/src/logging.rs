//! Tracing subscriber setup.
//!
//! All qse crates log through `tracing`; this module installs the global
//! subscriber for binaries and integration tests. Full transport diagnostics
//! (handshake failures, socket errors) are reported here at error level —
//! listener-facing events only ever carry one-line summaries.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Install the global tracing subscriber.
///
/// Filter is taken from `QSE_LOG`, then `RUST_LOG`, defaulting to `info`.
/// Calling this more than once is a no-op.
pub fn init() {
    let filter = EnvFilter::try_from_env("QSE_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .try_init();
}
