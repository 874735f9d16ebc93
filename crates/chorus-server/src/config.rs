//! Server configuration

use chorus_classifiers::PanelConfig;
use chorus_storage::StoreConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::cli::Cli;

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Listen port
    #[serde(default = "default_port")]
    pub port: u16,

    /// SQLite database file for analysis results
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// Per-request timeout applied to every provider call (seconds)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Replacement for the built-in safety instruction
    #[serde(default)]
    pub instruction: Option<String>,

    /// The three model seats
    #[serde(default)]
    pub panel: PanelConfig,
}

impl ServerConfig {
    /// Load configuration from file and CLI overrides
    pub fn load(config_path: &str, cli: &Cli) -> anyhow::Result<Self> {
        // Try to load from file, or use defaults
        let mut config = if Path::new(config_path).exists() {
            let content = std::fs::read_to_string(config_path)?;
            serde_yaml::from_str(&content)?
        } else {
            Self::default()
        };

        config.apply_overrides(cli);
        Ok(config)
    }

    fn apply_overrides(&mut self, cli: &Cli) {
        if let Some(listen) = &cli.listen {
            self.listen = listen.clone();
        }

        if let Some(port) = cli.port {
            self.port = port;
        }

        if let Some(database) = &cli.database {
            self.database_path = database.clone();
        }
    }

    /// Storage settings derived from this configuration
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            database_path: self.database_path.clone(),
            ..Default::default()
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            port: default_port(),
            database_path: default_database_path(),
            request_timeout_secs: default_request_timeout(),
            instruction: None,
            panel: PanelConfig::default(),
        }
    }
}

fn default_listen() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_database_path() -> PathBuf {
    StoreConfig::default().database_path
}

fn default_request_timeout() -> u64 {
    60
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = ServerConfig::load("/nonexistent/chorus.yaml", &Cli::default()).unwrap();
        assert_eq!(config.port, 8000);
        assert_eq!(config.database_path, PathBuf::from("chorus_results.db"));
        assert!(config.instruction.is_none());
    }

    #[test]
    fn test_file_then_cli_overrides() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "port: 9100\nlisten: 127.0.0.1\ninstruction: \"Reply with VERDICT: SAFE or VERDICT: UNSAFE.\""
        )
        .unwrap();

        let cli = Cli {
            port: Some(9200),
            database: Some(PathBuf::from("/tmp/other.db")),
            ..Default::default()
        };
        let config = ServerConfig::load(file.path().to_str().unwrap(), &cli).unwrap();

        assert_eq!(config.listen, "127.0.0.1");
        assert_eq!(config.port, 9200);
        assert_eq!(config.database_path, PathBuf::from("/tmp/other.db"));
        assert_eq!(
            config.instruction.as_deref(),
            Some("Reply with VERDICT: SAFE or VERDICT: UNSAFE.")
        );
        assert_eq!(config.panel.gpt5.model, "gpt-5.2");
    }

    #[test]
    fn test_block_scalar_instruction() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "instruction: |\n  Start your reply with VERDICT: SAFE or VERDICT: UNSAFE.\n  Then explain briefly.\n"
        )
        .unwrap();

        let config = ServerConfig::load(file.path().to_str().unwrap(), &Cli::default()).unwrap();
        assert_eq!(
            config.instruction.as_deref(),
            Some("Start your reply with VERDICT: SAFE or VERDICT: UNSAFE.\nThen explain briefly.\n")
        );
        assert_eq!(config.port, 8000);
    }

    #[test]
    fn test_invalid_yaml_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "port: [not, a, port]").unwrap();
        assert!(ServerConfig::load(file.path().to_str().unwrap(), &Cli::default()).is_err());
    }
}
