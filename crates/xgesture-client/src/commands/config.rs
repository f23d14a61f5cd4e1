//! Configuration commands.

use crate::config::ClientConfig;
use crate::error::{GestureError, GestureResult};

/// Dump the current configuration to stdout.
pub fn dump(config: &ClientConfig) -> GestureResult<()> {
    let toml_str = toml::to_string_pretty(config)
        .map_err(|e| GestureError::Config(format!("failed to serialize config: {}", e)))?;
    println!("# config.toml ({})", ClientConfig::default_path().display());
    println!("{}", toml_str);

    Ok(())
}

/// Validate the configuration.
pub fn validate(config: &ClientConfig) -> GestureResult<()> {
    config.validate().map_err(GestureError::Config)?;
    println!("Configuration is valid.");
    Ok(())
}

/// Show the configuration file path.
pub fn path() -> GestureResult<()> {
    let config_path = ClientConfig::default_path();
    println!("config: {}", config_path.display());
    Ok(())
}
