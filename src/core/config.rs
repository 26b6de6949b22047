use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

pub const DEFAULT_WISE_URL: &str = "https://wise.com";
pub const DEFAULT_PROXY_URL: &str = "https://api.allorigins.win/raw";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct WiseProviderConfig {
    pub base_url: String,
    /// CORS relay the request is routed through; the Wise URL is passed as its
    /// `url` parameter. Omitted means the default relay, `~` goes direct.
    #[serde(default = "default_proxy_url")]
    pub proxy_url: Option<String>,
}

fn default_proxy_url() -> Option<String> {
    Some(DEFAULT_PROXY_URL.to_string())
}

impl Default for WiseProviderConfig {
    fn default() -> Self {
        WiseProviderConfig {
            base_url: DEFAULT_WISE_URL.to_string(),
            proxy_url: default_proxy_url(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub wise: WiseProviderConfig,
}

fn default_targets() -> Vec<String> {
    vec!["EUR".to_string(), "INR".to_string()]
}

fn default_decimals() -> usize {
    2
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default = "default_targets")]
    pub default_targets: Vec<String>,
    #[serde(default = "default_decimals")]
    pub decimals: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            providers: ProvidersConfig::default(),
            default_targets: default_targets(),
            decimals: default_decimals(),
        }
    }
}

impl AppConfig {
    /// Loads the default config file, falling back to built-in defaults when
    /// none has been created yet.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!(
                "No config at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("app", "fxvoyage", "fxv")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }
}
