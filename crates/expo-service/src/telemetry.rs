//! Tracing initialization.
//!
//! ## Filter
//! - `RUST_LOG` wins when set (e.g. `RUST_LOG=expo_db=trace`)
//! - Default: `info`, debug for the expo crates, sqlx quieted to `warn`

use tracing_subscriber::EnvFilter;

/// Default directives when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info,expo_db=debug,expo_service=debug,sqlx=warn";

/// Installs the global fmt subscriber.
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
