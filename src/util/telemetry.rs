//! Telemetry helpers for structured logging and tracing.

use tracing_subscriber::EnvFilter;

/// Default filter when logging is switched on.
pub const LOGGING_ON_FILTER: &str = "workpool_bench=debug,info";

/// Filter used for the on/off switch when `RUST_LOG` is not set.
#[must_use]
pub fn default_filter(logging_on: bool) -> &'static str {
    if logging_on {
        LOGGING_ON_FILTER
    } else {
        "off"
    }
}

/// Whether a command-line logging switch means "on": any value containing `on`.
#[must_use]
pub fn logging_switch(arg: &str) -> bool {
    arg.contains("on")
}

/// Initialize tracing. If a subscriber is already installed this is a no-op;
/// otherwise `RUST_LOG` wins over the on/off switch.
pub fn init_tracing(logging_on: bool) {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(logging_on)));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(true)
        .try_init();
}
