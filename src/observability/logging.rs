//! Structured logging.
//!
//! `RUST_LOG` overrides the configured level. `log_format = "json"` switches
//! to one JSON object per line.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::schema::ObservabilityConfig;

/// Install the global subscriber. Call once, before anything logs.
pub fn init_logging(config: &ObservabilityConfig, debug: bool) {
    let level = if debug { "debug" } else { config.log_level.as_str() };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("mockgate={level},tower_http={level}").into());

    let registry = tracing_subscriber::registry().with(filter);
    if config.log_format.eq_ignore_ascii_case("json") {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}
