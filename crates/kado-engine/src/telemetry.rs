//! Tracing setup for hosts embedding the engine.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Install a fmt subscriber filtered by `RUST_LOG`, defaulting to `INFO`.
///
/// Returns `false` if a global subscriber was already installed, so it is
/// safe to call more than once.
pub fn init() -> bool {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .try_init()
    .is_ok()
}
