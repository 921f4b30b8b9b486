use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable that overrides `api_base_url`
pub const API_URL_ENV: &str = "KUBECHAT_API_URL";

/// Main application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the assistant API (`POST {base}/api/chat`)
    pub api_base_url: String,

    /// Per-request timeout applied by the HTTP provider
    pub request_timeout_secs: u64,

    /// Where exports are written; the current directory when unset
    pub export_dir: Option<PathBuf>,

    /// Default log level when `RUST_LOG` is not set
    pub log_level: String,

    /// UI preferences
    pub ui: UiConfig,

    /// kubechat home directory
    #[serde(skip)]
    pub kubechat_home: PathBuf,
}

/// UI configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub show_suggestions: bool,
    pub tick_rate_ms: u64,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            show_suggestions: true,
            tick_rate_ms: 300,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("~"));

        Config {
            api_base_url: "http://localhost:8080".to_string(),
            request_timeout_secs: 60,
            export_dir: None,
            log_level: "info".to_string(),
            ui: UiConfig::default(),
            kubechat_home: home.join(".kubechat"),
        }
    }
}

impl Config {
    /// Load `~/.kubechat/config.toml`, falling back to defaults, then apply
    /// environment overrides.
    pub fn load() -> Result<Self> {
        let home = dirs::home_dir().context("Could not find home directory")?;
        let kubechat_home = home.join(".kubechat");

        fs::create_dir_all(&kubechat_home).context("Failed to create .kubechat directory")?;

        let mut config = Self::load_from(&kubechat_home.join("config.toml"))?;
        config.kubechat_home = kubechat_home;
        config.apply_env_overrides(std::env::var(API_URL_ENV).ok());

        Ok(config)
    }

    /// Load from an explicit path; a missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.ui.tick_rate_ms == 0 {
            bail!("ui.tick_rate_ms must be at least 1");
        }
        if self.request_timeout_secs == 0 {
            bail!("request_timeout_secs must be at least 1");
        }
        Ok(())
    }

    /// Save configuration to `~/.kubechat/config.toml`
    pub fn save(&self) -> Result<()> {
        self.save_to(&self.config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content).context("Failed to write config file")?;
        Ok(())
    }

    pub fn config_path(&self) -> PathBuf {
        self.kubechat_home.join("config.toml")
    }

    pub fn log_dir(&self) -> PathBuf {
        self.kubechat_home.join("logs")
    }

    /// Export directory, defaulting to the current working directory
    pub fn export_dir(&self) -> PathBuf {
        self.export_dir
            .clone()
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
    }

    fn apply_env_overrides(&mut self, api_url: Option<String>) {
        if let Some(url) = api_url.filter(|url| !url.trim().is_empty()) {
            self.api_base_url = url;
        }
    }

    /// Override the API URL (the CLI flag wins over file and environment)
    pub fn set_api_url(&mut self, url: String) {
        self.api_base_url = url;
    }
}
