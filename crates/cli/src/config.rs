use std::{
    fs,
    path::{Path, PathBuf},
};

use bounty_warden_core::config::{
    load_bounty_warden_config, BountyWardenConfig, RewardsConfig, CONFIG_FILE_NAME,
};
use bounty_warden_core::errors::ConfigLoadError;
use tracing::{debug, info};

use crate::errors::CliError;

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

/// Resolves the configuration file path, defaulting to `bounty-warden.toml`
/// in the working directory.
pub fn get_config_path(path: Option<&str>) -> PathBuf {
    match path {
        Some(p) => PathBuf::from(p),
        None => PathBuf::from(CONFIG_FILE_NAME),
    }
}

/// Loads the configuration, falling back to the defaults when no path was
/// given and the default file does not exist.
pub fn load_config(path: Option<&str>) -> Result<BountyWardenConfig, CliError> {
    let config_path = get_config_path(path);
    debug!("Loading configuration from {:?}", config_path);

    match load_bounty_warden_config(&config_path) {
        Ok(config) => Ok(config),
        Err(ConfigLoadError::NotFound(_)) if path.is_none() => {
            info!("No configuration file found. Using the default configuration");
            Ok(BountyWardenConfig::default())
        }
        Err(e) => Err(CliError::ConfigError(format!(
            "Failed to load {:?}: {}",
            config_path, e
        ))),
    }
}

/// The configuration written by `config init`: every default spelled out so
/// it can be edited in place.
pub fn documented_config() -> BountyWardenConfig {
    BountyWardenConfig {
        rewards: RewardsConfig::documented_defaults(),
        ..BountyWardenConfig::default()
    }
}

/// Save configuration to the specified file
pub fn save_config(config: &BountyWardenConfig, path: &Path) -> Result<(), CliError> {
    debug!("Saving configuration to {:?}", path);

    let content = toml::to_string_pretty(config)
        .map_err(|e| CliError::ConfigError(format!("Failed to serialize configuration: {}", e)))?;

    // Create parent directories if they don't exist
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| {
                CliError::ConfigError(format!("Failed to create directory: {}", e))
            })?;
        }
    }

    fs::write(path, content).map_err(|e| {
        CliError::ConfigError(format!("Failed to write configuration file: {}", e))
    })?;

    info!("Configuration saved to {:?}", path);
    Ok(())
}
