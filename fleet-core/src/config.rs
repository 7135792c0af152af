//! Configuration management for OpenFleet
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (OPENFLEET_*)
//! 3. Config file (~/.config/openfleet/config.toml)
//! 4. Default values

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Default port of the review server
pub const DEFAULT_PORT: u16 = 4242;

/// Number of consecutive ports tried before giving up
pub const DEFAULT_MAX_PORT_ATTEMPTS: u16 = 10;

/// Review server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind
    pub host: String,

    /// Preferred port; the next ports are tried if it is taken
    pub port: u16,

    /// How many ports to try, starting at `port`
    pub max_port_attempts: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            max_port_attempts: DEFAULT_MAX_PORT_ATTEMPTS,
        }
    }
}

impl ServerConfig {
    /// Base URL for a server bound on `port`
    pub fn base_url(port: u16) -> String {
        format!("http://localhost:{}", port)
    }
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Root data directory; reviews live in `<data_dir>/reviews`
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let data_dir = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".openfleet");

        Self { data_dir }
    }
}

impl StorageConfig {
    /// Directory holding review and thread files
    pub fn reviews_dir(&self) -> PathBuf {
        self.data_dir.join("reviews")
    }
}

/// Browser client configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UiConfig {
    /// Interval between document/thread refreshes while the tab is visible
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
        }
    }
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub ui: UiConfig,
}

impl Config {
    /// Load configuration from the default config file location
    ///
    /// Returns default config if file doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();

        if let Some(path) = config_path {
            if path.exists() {
                return Self::load_from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(Error::Io)?;
        toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Get the default config file path
    ///
    /// Returns `~/.config/openfleet/config.toml` on Unix
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("openfleet").join("config.toml"))
    }

    /// Apply environment variable overrides
    ///
    /// Supported variables:
    /// - OPENFLEET_PORT: Preferred review server port
    /// - OPENFLEET_DATA_DIR: Root data directory
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Ok(port) = std::env::var("OPENFLEET_PORT") {
            self.server.port = port
                .parse()
                .map_err(|e| Error::Config(format!("Invalid OPENFLEET_PORT '{}': {}", port, e)))?;
        }

        if let Ok(data_dir) = std::env::var("OPENFLEET_DATA_DIR") {
            self.storage.data_dir = PathBuf::from(data_dir);
        }

        Ok(self)
    }

    /// Apply CLI flag overrides
    pub fn with_cli_overrides(mut self, port: Option<u16>, data_dir: Option<PathBuf>) -> Self {
        if let Some(port) = port {
            self.server.port = port;
        }

        if let Some(dir) = data_dir {
            self.storage.data_dir = dir;
        }

        self
    }

    /// Load configuration with all overrides applied
    ///
    /// Priority: CLI > env > config file > defaults
    pub fn load_with_overrides(port: Option<u16>, data_dir: Option<PathBuf>) -> Result<Self> {
        Ok(Self::load()?
            .with_env_overrides()?
            .with_cli_overrides(port, data_dir))
    }
}
