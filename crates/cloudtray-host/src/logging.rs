//! Tracing subscriber setup

use cloudtray_core::config::LoggingConfig;
use tracing_subscriber::EnvFilter;

use crate::{HostError, Result};

/// Installs the global fmt subscriber
///
/// `RUST_LOG` takes precedence over `config.level`. Returns `Ok(false)` if a
/// subscriber was already installed, which leaves the existing one in place.
pub fn init(config: &LoggingConfig) -> Result<bool> {
    let filter = build_filter(config)?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    let installed = if config.json {
        builder.json().try_init().is_ok()
    } else {
        builder.try_init().is_ok()
    };
    Ok(installed)
}

fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.level).map_err(|e| HostError::Logging(e.to_string())),
    }
}
