//! Tracing subscriber setup and request logging helpers

use std::time::Duration;

use cellarsync_domain::CellarSyncError;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is not set.
pub const DEFAULT_LOG_FILTER: &str = "info,cellarsync=debug";

/// Set to `json` to emit one JSON object per event.
pub const LOG_FORMAT_ENV: &str = "CELLARSYNC_LOG_FORMAT";

/// Install the global tracing subscriber.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let json = std::env::var(LOG_FORMAT_ENV)
        .map(|value| value.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let result = if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().with_current_span(true).try_init()
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).try_init()
    };

    if result.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

/// Log the outcome of a handled request with structured fields.
///
/// `route` must be a static route label, never a raw path with user input.
#[inline]
pub fn log_request_outcome(route: &str, elapsed: Duration, error: Option<&CellarSyncError>) {
    let duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);

    match error {
        None => info!(route, duration_ms, "request_success"),
        Some(err) => warn!(route, duration_ms, error_type = err.label(), error = %err, "request_failure"),
    }
}
