//! Tracing setup for front ends.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when `RUST_LOG` is unset or unparsable.
pub const DEFAULT_FILTER: &str = "warn";

/// Installs a fmt subscriber writing to stderr.
///
/// `RUST_LOG` wins when set; otherwise `verbose` selects `debug` for the
/// portal crates and [`DEFAULT_FILTER`] for everything else. Calling it twice
/// is a no-op.
pub fn init_tracing(verbose: bool) {
    let fallback = if verbose {
        "warn,cityportal=debug,cityportal_application=debug,cityportal_infrastructure=debug"
    } else {
        DEFAULT_FILTER
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    // try_init fails only when a global subscriber is already installed.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}
