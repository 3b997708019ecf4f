//! Tracing initialization utilities.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Default filter for the given debug setting.
///
/// Debug mode logs this crate at `debug` and everything else at `info`;
/// otherwise this crate logs at `info` and dependencies only warn.
pub fn default_filter(debug: bool) -> &'static str {
    if debug {
        "servicenow_mcp=debug,info"
    } else {
        "servicenow_mcp=info,warn"
    }
}

/// Initialize tracing with the given default filter.
///
/// The filter can be overridden by the `RUST_LOG` environment variable.
/// Output goes to stderr.
///
/// # Example
///
/// ```rust
/// use servicenow_mcp::bootstrap::{default_filter, init_tracing};
///
/// init_tracing(default_filter(false));
/// ```
pub fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}
