use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Stream played by the client-side test step when none is configured
pub const DEFAULT_STREAM_URL: &str = "https://ice1.somafm.com/groovesalad-128-mp3";

/// A server/client machine pair. Values are shown verbatim, never validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub name: String,
    pub server_ip: String,  // Machine with the speakers
    pub client_ip: String,  // Machine sending audio
}

impl Connection {
    pub fn new(name: impl Into<String>, server_ip: impl Into<String>, client_ip: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            server_ip: server_ip.into(),
            client_ip: client_ip.into(),
        }
    }
}

/// Optional color overrides, `#RRGGBB` or `#RGB`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThemeConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub danger: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_dim: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Known machine pairs
    #[serde(default)]
    pub connections: Vec<Connection>,

    /// URL substituted into the client playback test
    #[serde(default = "default_stream_url")]
    pub stream_url: String,

    #[serde(default)]
    pub theme: ThemeConfig,
}

fn default_stream_url() -> String {
    DEFAULT_STREAM_URL.to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            connections: Vec::new(),
            stream_url: default_stream_url(),
            theme: ThemeConfig::default(),
        }
    }
}

impl AppConfig {
    /// Get the default config file path
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?
            .join("pulsepair");

        if let Err(e) = std::fs::create_dir_all(&config_dir) {
            tracing::warn!("Could not create config directory: {}", e);
        }

        Ok(config_dir.join("config.toml"))
    }

    /// Load config from `path`, writing defaults when the file does not exist yet
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            match std::fs::read_to_string(path) {
                Ok(content) => match toml::from_str(&content) {
                    Ok(config) => return Ok(config),
                    Err(e) => tracing::warn!("Failed to parse config {}: {}", path.display(), e),
                },
                Err(e) => tracing::warn!("Failed to read config {}: {}", path.display(), e),
            }
            // Leave a broken file alone so the user can fix it
            return Ok(AppConfig::default());
        }

        let config = AppConfig::default();
        if let Err(e) = config.save_to(path) {
            tracing::debug!("Could not write default config: {}", e);
        }
        Ok(config)
    }

    /// Save config to `path`
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let mut clean_config = self.clone();
        clean_config.connections.retain(|c| !c.name.trim().is_empty());

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(&clean_config)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Find a connection by name, ignoring case
    pub fn find(&self, name: &str) -> Option<&Connection> {
        self.connections
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }
}
