//! Application configuration file support.
//!
//! Reads `segment_insights.toml`:
//!
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 8080
//!
//! [[datasets]]
//! name = "2024 survey"
//! rows = "data/segments.json"
//! reference = "data/reference.json"
//! catalog = "data/catalog.json"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// File name searched by [`AppConfig::from_default_location`].
pub const CONFIG_FILE_NAME: &str = "segment_insights.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSettings,
    /// Datasets preloaded when the server starts.
    #[serde(default)]
    pub datasets: Vec<DatasetSource>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Files making up one dataset. Relative paths resolve against the working directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSource {
    pub name: String,
    pub rows: PathBuf,
    #[serde(default)]
    pub reference: Option<PathBuf>,
    #[serde(default)]
    pub catalog: Option<PathBuf>,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Load configuration from the default location.
    ///
    /// Searches for `segment_insights.toml` in:
    /// 1. Current directory
    /// 2. `backend/` directory
    /// 3. Parent directory
    pub fn from_default_location() -> Result<Self> {
        let search_paths = [
            PathBuf::from(CONFIG_FILE_NAME),
            PathBuf::from("backend").join(CONFIG_FILE_NAME),
            PathBuf::from("..").join(CONFIG_FILE_NAME),
        ];

        for path in &search_paths {
            if path.exists() {
                return Self::from_file(path);
            }
        }

        anyhow::bail!("No {} found in standard locations", CONFIG_FILE_NAME)
    }

    /// Apply `HOST` and `PORT` from the environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(std::env::var("HOST").ok(), std::env::var("PORT").ok())
    }

    /// Override the bind address. An unparsable port is ignored.
    pub fn with_overrides(mut self, host: Option<String>, port: Option<String>) -> Self {
        if let Some(host) = host.filter(|h| !h.trim().is_empty()) {
            self.server.host = host;
        }
        match port.map(|p| p.trim().parse::<u16>()) {
            Some(Ok(port)) => self.server.port = port,
            Some(Err(e)) => log::warn!("Ignoring invalid PORT override: {}", e),
            None => {}
        }
        self
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
