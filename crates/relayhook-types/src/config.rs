//! Client configuration types.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Maximum single frame size accepted from the relay (16 MB).
pub const DEFAULT_MAX_FRAME_BYTES: usize = 16 * 1024 * 1024;

/// Configuration for one relay client process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Agent name, used in logs and handler contexts.
    pub name: String,
    /// Relay host.
    pub host: String,
    /// Relay port.
    pub port: u16,
    /// Start the console in multi-line mode.
    pub multiline: bool,
    /// Inbound frames larger than this are skipped.
    pub max_frame_bytes: usize,
    /// Default log filter when `RUST_LOG` is unset.
    pub log_level: String,
    /// Interval between send ticks for agents without console input.
    pub tick_interval_ms: u64,
    /// Attach a `from` field to outgoing payloads.
    pub tag_sender: bool,
    /// Sender id written into the `from` field.
    pub sender: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            name: "relayhook-agent".to_string(),
            host: "127.0.0.1".to_string(),
            port: 8888,
            multiline: false,
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
            log_level: "info".to_string(),
            tick_interval_ms: 50,
            tag_sender: true,
            sender: "user".to_string(),
        }
    }
}

impl ClientConfig {
    /// `host:port` of the relay.
    pub fn relay_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Default config location: `~/.relayhook/config.toml`.
pub fn default_config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".relayhook")
        .join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.relay_addr(), "127.0.0.1:8888");
        assert!(!config.multiline);
        assert_eq!(config.max_frame_bytes, DEFAULT_MAX_FRAME_BYTES);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: ClientConfig = toml::from_str("port = 9000\nmultiline = true\n").unwrap();
        assert_eq!(config.port, 9000);
        assert!(config.multiline);
        assert_eq!(config.host, "127.0.0.1");
        assert!(config.tag_sender);
        assert_eq!(config.sender, "user");
    }

    #[test]
    fn test_default_config_path_file_name() {
        let path = default_config_path();
        assert!(path.ends_with(".relayhook/config.toml"));
    }
}
