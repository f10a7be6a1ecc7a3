//! Configuration types for httpdump

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{DumpError, Result};

/// Default listen port
pub const DEFAULT_PORT: u16 = 1234;

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Address to bind the listener to
    #[serde(default = "default_bind_address")]
    pub bind_address: IpAddr,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
    /// Directory holding the bundled UI, served for unmatched paths
    #[serde(default)]
    pub ui_dir: Option<PathBuf>,
    /// Resource limits
    #[serde(default)]
    pub limits: LimitsConfig,
}

fn default_bind_address() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

/// Resource limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Maximum concurrent connections
    pub max_connections: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_connections: 4096,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: DEFAULT_PORT,
            ui_dir: None,
            limits: LimitsConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from TOML file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| DumpError::ConfigError(format!("Failed to read config file: {e}")))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| DumpError::ConfigError(format!("Failed to parse config: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns error if configuration is invalid
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(DumpError::ConfigError("port cannot be 0".to_string()));
        }

        if self.limits.max_connections == 0 {
            return Err(DumpError::ConfigError(
                "max_connections must be > 0".to_string(),
            ));
        }

        if let Some(ref dir) = self.ui_dir {
            if !dir.is_dir() {
                return Err(DumpError::ConfigError(format!(
                    "UI directory does not exist: {}",
                    dir.display()
                )));
            }
        }

        Ok(())
    }

    /// Socket address to listen on
    #[must_use]
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_config_defaults() {
        let config: Config = toml::from_str("").unwrap();

        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.listen_addr().to_string(), "0.0.0.0:1234");
        assert!(config.ui_dir.is_none());
        assert_eq!(config.limits.max_connections, 4096);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_parse() {
        let config_toml = r#"
            bind_address = "127.0.0.1"
            port = 8080

            [limits]
            max_connections = 16
        "#;

        let config: Config = toml::from_str(config_toml).unwrap();
        assert_eq!(config.listen_addr().to_string(), "127.0.0.1:8080");
        assert_eq!(config.limits.max_connections, 16);
    }

    #[test]
    fn test_config_from_file() {
        let ui = TempDir::new().unwrap();
        let mut file = NamedTempFile::new().unwrap();
        let config_toml = format!("port = 9000\nui_dir = {:?}\n", ui.path().display().to_string());
        file.write_all(config_toml.as_bytes()).unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.ui_dir.as_deref(), Some(ui.path()));
    }

    #[test]
    fn test_invalid_config_zero_port() {
        let config: Config = toml::from_str("port = 0").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_config_missing_ui_dir() {
        let config: Config = toml::from_str(r#"ui_dir = "/definitely/not/here""#).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_config_zero_connections() {
        let config: Config = toml::from_str("[limits]\nmax_connections = 0").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_file() {
        let result = Config::from_file(std::path::Path::new("/no/such/httpdump.toml"));
        assert!(matches!(result, Err(DumpError::ConfigError(_))));
    }
}
