// Logging initialization
//
// Call once at process start. Filter level comes from RUST_LOG; the default
// keeps this crate at info and everything else at warn.

use tracing_subscriber::{fmt, EnvFilter};

/// Initialize the global tracing subscriber. Safe to call from tests;
/// repeated calls are ignored.
pub fn init() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,eduforge_ai=info"));

    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
