//! Startup configuration resolution.
//!
//! Order: config file (or defaults) → environment → command line → validation.

use std::path::Path;

use crate::config::{apply_env_overrides, load_config, validate_config, ConfigError, GatewayConfig};

/// Resolve the effective configuration.
///
/// Without a `path` the built-in defaults are used.
pub fn load_startup_config(
    path: Option<&Path>,
    bind_override: Option<&str>,
) -> Result<GatewayConfig, ConfigError> {
    let mut config = match path {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };

    apply_env_overrides(&mut config);
    if let Some(bind) = bind_override {
        config.listener.bind_address = bind.to_string();
    }

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}
