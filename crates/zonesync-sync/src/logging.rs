//! Tracing setup for hosts embedding the engine

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use zonesync_core::config::LoggingConfig;

/// Builds the filter: `RUST_LOG` when set, otherwise the configured level
pub fn env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level))
}

/// Installs a global `fmt` subscriber
///
/// Fails if the host already installed a global subscriber.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let filter = env_filter(config);
    let result = if config.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .try_init()
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .try_init()
    };

    result.map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {e}"))
}
