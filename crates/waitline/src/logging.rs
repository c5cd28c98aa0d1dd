//! `tracing-subscriber` setup for test runs.

use crate::config::WaitConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Environment variable holding the log filter
pub const LOG_ENV: &str = "WAITLINE_LOG";

fn filter(default_filter: &str) -> EnvFilter {
    resolve_filter(std::env::var(LOG_ENV).ok().as_deref(), default_filter)
}

fn resolve_filter(from_env: Option<&str>, default_filter: &str) -> EnvFilter {
    from_env
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .or_else(|| EnvFilter::try_new(default_filter).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

/// Install a human-readable subscriber.
///
/// The filter comes from `WAITLINE_LOG`, falling back to `default_filter`.
/// Returns `false` if a global subscriber was already installed.
pub fn init_logging(default_filter: &str) -> bool {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .with(filter(default_filter))
        .try_init()
        .is_ok()
}

/// [`init_logging`] with the config's `log_filter` as the default
pub fn init_logging_from(config: &WaitConfig) -> bool {
    init_logging(&config.log_filter)
}

/// Install a JSON-lines subscriber, for CI log collection
pub fn init_json_logging(default_filter: &str) -> bool {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().json().with_test_writer())
        .with(filter(default_filter))
        .try_init()
        .is_ok()
}
