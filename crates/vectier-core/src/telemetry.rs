//! Tracing initialization
//!
//! Installs a `tracing-subscriber` registry with an env filter and a
//! console formatting layer. `RUST_LOG` overrides the default filter.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};

/// Default filter when `verbose` is requested.
pub const VERBOSE_FILTER: &str = "info,vectier=debug";

/// Default filter otherwise.
pub const QUIET_FILTER: &str = "warn";

/// Initialize the global tracing subscriber.
///
/// Returns `false` if a global subscriber was already installed, in which
/// case the existing one is left in place.
pub fn init_tracing(verbose: bool) -> bool {
    let default_filter = if verbose { VERBOSE_FILTER } else { QUIET_FILTER };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_line_number(true);

    Registry::default()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init_tracing(true);
        // Second install must not panic.
        assert!(!init_tracing(false));
        tracing::debug!("tracing initialized");
    }
}
