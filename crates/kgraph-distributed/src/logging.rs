//! Structured logging setup.
//!
//! Filters come from the `KGRAPH_LOG` environment variable:
//!
//! - `KGRAPH_LOG=info` - Default level
//! - `KGRAPH_LOG=debug` - Partition sizes, orphan drops, dedup counts
//! - `KGRAPH_LOG=warn,kgraph_distributed::federation=debug` - Combined filters
//!
//! When the variable is unset, the level passed in (or `logging.level`
//! from [`LoggingConfig`]) applies.

use crate::config::LoggingConfig;
use tracing_subscriber::{EnvFilter, fmt};

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "KGRAPH_LOG";

/// Default level when neither `KGRAPH_LOG` nor a config level is given.
pub const DEFAULT_LEVEL: &str = "info";

/// `KGRAPH_LOG` if set and valid, else `default_level`.
fn filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Initializes the global tracing subscriber at `info`.
///
/// Subsequent calls are ignored (tracing only allows one subscriber).
pub fn init() {
    init_with_default(DEFAULT_LEVEL);
}

/// Initializes compact human-readable logging with a custom default level.
pub fn init_with_default(default_level: &str) {
    let _ = fmt()
        .with_env_filter(filter(default_level))
        .with_target(true)
        .compact()
        .try_init();
}

/// Initializes JSON logging, one object per event.
pub fn init_json(default_level: &str) {
    let _ = fmt()
        .with_env_filter(filter(default_level))
        .with_target(true)
        .json()
        .with_current_span(false)
        .try_init();
}

/// Initializes logging from a [`LoggingConfig`].
pub fn init_from_config(config: &LoggingConfig) {
    if config.json {
        init_json(&config.level);
    } else {
        init_with_default(&config.level);
    }
}
