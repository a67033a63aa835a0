//! Log setup for the native binaries. The library itself only emits events.

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter (`info` when unset).
pub const LOG_ENV: &str = "SIDEMARKS_LOG";

/// Installs a stderr `fmt` subscriber filtered by `SIDEMARKS_LOG`. Stdout is
/// left to the binaries' own output.
pub fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
