use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct NinjaProviderConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProvidersConfig {
    pub ninja: Option<NinjaProviderConfig>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            ninja: Some(NinjaProviderConfig {
                base_url: "https://poe.ninja".to_string(),
            }),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    /// League used for new transactions and price lookups unless one was
    /// selected at runtime.
    pub league: String,
    #[serde(default)]
    pub providers: ProvidersConfig,
    /// Decimals shown in tables; stored amounts always keep six.
    #[serde(default = "default_display_decimals")]
    pub display_decimals: u32,
    /// Minutes a fetched exchange rate stays fresh.
    #[serde(default = "default_rate_ttl_minutes")]
    pub rate_ttl_minutes: i64,
    pub data_path: Option<String>,
}

fn default_display_decimals() -> u32 {
    2
}

fn default_rate_ttl_minutes() -> i64 {
    30
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("in", "codito", "poeflip")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn default_data_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs = ProjectDirs::from("in", "codito", "poeflip")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    pub fn ninja_base_url(&self) -> &str {
        self.providers
            .ninja
            .as_ref()
            .map_or("https://poe.ninja", |p| p.base_url.as_str())
    }
}
