//! Clap CLI definitions for the relayhook console agent.

use clap::Parser;
use relayhook_types::config::ClientConfig;
use std::path::PathBuf;

/// Console agent: type messages to the relay, print what it sends back.
#[derive(Parser, Debug)]
#[command(
    name = "relayhook",
    version,
    about = "Console input agent for a relayhook relay",
    after_help = "In multi-line mode, end a line with `\\` to continue the message on the next line."
)]
pub struct Cli {
    /// Path to config file (default: ~/.relayhook/config.toml).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Relay host.
    #[arg(long)]
    pub host: Option<String>,

    /// Relay port.
    #[arg(long)]
    pub port: Option<u16>,

    /// Agent name.
    #[arg(long)]
    pub name: Option<String>,

    /// Multi-line input: 1 enables `\` continuation, 0 sends every line.
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=1))]
    pub multiline: Option<u8>,
}

impl Cli {
    /// Apply flag overrides on top of file configuration.
    pub fn apply(&self, config: &mut ClientConfig) {
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(name) = &self.name {
            config.name = name.clone();
        }
        if let Some(multiline) = self.multiline {
            config.multiline = multiline == 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::try_parse_from([
            "relayhook",
            "--multiline",
            "1",
            "--port",
            "9000",
            "--name",
            "InputAgent",
        ])
        .unwrap();
        let mut config = ClientConfig::default();
        cli.apply(&mut config);
        assert!(config.multiline);
        assert_eq!(config.port, 9000);
        assert_eq!(config.name, "InputAgent");
        assert_eq!(config.host, "127.0.0.1");
    }

    #[test]
    fn test_absent_flags_keep_config() {
        let cli = Cli::try_parse_from(["relayhook"]).unwrap();
        let mut config = ClientConfig {
            multiline: true,
            ..ClientConfig::default()
        };
        cli.apply(&mut config);
        assert!(config.multiline);
    }

    #[test]
    fn test_multiline_rejects_other_values() {
        assert!(Cli::try_parse_from(["relayhook", "--multiline", "2"]).is_err());
        assert!(Cli::try_parse_from(["relayhook", "--multiline", "yes"]).is_err());
    }
}
