//! Server configuration management

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, TitanError};

const CONFIG_FILE: &str = "titan.json";

pub const IDENTITY_ENV: &str = "TITAN_IDENTITY";
pub const PORT_ENV: &str = "TITAN_PORT";

fn default_identity() -> String {
    "titan".to_string()
}

fn default_port() -> u16 {
    5001
}

fn default_log_filter() -> String {
    "titan=info".to_string()
}

/// Complete server configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    /// Name of this server instance
    #[serde(default = "default_identity")]
    pub identity: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Tracing filter used when `RUST_LOG` is not set
    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    /// Where repository state is persisted; in-memory when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_file: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            identity: default_identity(),
            port: default_port(),
            log_filter: default_log_filter(),
            state_file: None,
        }
    }
}

impl ServerConfig {
    /// Default configuration directory
    pub fn default_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("titan")
    }

    /// Load configuration from disk
    pub fn load(config_dir: &Path) -> Result<Self> {
        let config_path = config_dir.join(CONFIG_FILE);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Load from disk, then apply `TITAN_*` environment overrides
    pub fn load_with_env(config_dir: &Path) -> Result<Self> {
        let mut config = Self::load(config_dir)?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(identity) = lookup(IDENTITY_ENV) {
            self.identity = identity;
        }
        if let Some(port) = lookup(PORT_ENV) {
            self.port = port
                .parse()
                .map_err(|_| TitanError::config(format!("Invalid {} '{}'", PORT_ENV, port)))?;
        }
        Ok(())
    }

    /// Save configuration to disk
    pub fn save(&self, config_dir: &Path) -> Result<()> {
        std::fs::create_dir_all(config_dir)?;

        let config_path = config_dir.join(CONFIG_FILE);
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, contents)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_config_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_dir = temp_dir.path();

        let config = ServerConfig {
            identity: "test".to_string(),
            port: 6001,
            log_filter: "titan=debug".to_string(),
            state_file: Some(config_dir.join("state.json")),
        };

        config.save(config_dir).unwrap();
        let loaded = ServerConfig::load(config_dir).unwrap();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_config_load_nonexistent() {
        let temp_dir = TempDir::new().unwrap();
        let config = ServerConfig::load(temp_dir.path()).unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.port, 5001);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join(CONFIG_FILE), r#"{"port": 7000}"#).unwrap();

        let config = ServerConfig::load(temp_dir.path()).unwrap();
        assert_eq!(config.port, 7000);
        assert_eq!(config.identity, "titan");
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [(IDENTITY_ENV, "staging"), (PORT_ENV, "6001")].into();
        let mut config = ServerConfig::default();
        config
            .apply_overrides(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.identity, "staging");
        assert_eq!(config.port, 6001);
    }

    #[test]
    fn test_invalid_port_override() {
        let mut config = ServerConfig::default();
        let err = config
            .apply_overrides(|key| (key == PORT_ENV).then(|| "not-a-port".to_string()))
            .unwrap_err();
        assert!(err.is_configuration());
    }
}
