//! Tracing setup for binaries and examples embedding the server.

use tracing_subscriber::EnvFilter;

/// Installs the global tracing subscriber.
///
/// Honours `RUST_LOG`; defaults to `info` for the durbar crates. Calling
/// it twice is a no-op rather than a panic, which keeps tests that share
/// a process happy.
pub fn init() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,durbar=debug"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
