//! Configuration loading from `~/.relayhook/config.toml` with defaults.

use relayhook_types::config::{default_config_path, ClientConfig};
use std::path::Path;
use tracing::{info, warn};

/// Load client configuration from a TOML file, with defaults.
///
/// A missing, unreadable or invalid file never fails startup: the problem is
/// logged and [`ClientConfig::default`] is used.
pub fn load_config(path: Option<&Path>) -> ClientConfig {
    let config_path = path
        .map(|p| p.to_path_buf())
        .unwrap_or_else(default_config_path);

    if !config_path.exists() {
        info!(
            path = %config_path.display(),
            "Config file not found, using defaults"
        );
        return ClientConfig::default();
    }

    match std::fs::read_to_string(&config_path) {
        Ok(contents) => match toml::from_str::<ClientConfig>(&contents) {
            Ok(config) => {
                info!(path = %config_path.display(), "Loaded configuration");
                config
            }
            Err(e) => {
                warn!(
                    error = %e,
                    path = %config_path.display(),
                    "Failed to parse config, using defaults"
                );
                ClientConfig::default()
            }
        },
        Err(e) => {
            warn!(
                error = %e,
                path = %config_path.display(),
                "Failed to read config file, using defaults"
            );
            ClientConfig::default()
        }
    }
}
