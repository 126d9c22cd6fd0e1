//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use crate::application::errors::ConfigError;

/// Host configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    pub bot: BotConfig,
    pub plugins: PluginConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct BotConfig {
    pub name: String,
    pub prefix: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct PluginConfig {
    /// Root holding one directory per plugin unit
    pub directory: PathBuf,
    /// Plugin or unit names that are discovered but never instantiated
    #[serde(default)]
    pub disabled: Vec<String>,
    /// Upper bound for a single lifecycle hook, 0 waits forever
    #[serde(default = "default_hook_timeout")]
    pub hook_timeout_secs: u64,
    /// Where shadow copies of plugin libraries are loaded from
    #[serde(default)]
    pub shadow_directory: Option<PathBuf>,
}

fn default_hook_timeout() -> u64 {
    30
}

impl PluginConfig {
    pub fn hook_timeout(&self) -> Option<Duration> {
        (self.hook_timeout_secs > 0).then(|| Duration::from_secs(self.hook_timeout_secs))
    }

    pub fn shadow_directory(&self) -> PathBuf {
        self.shadow_directory
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("carik-plugins"))
    }
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("./plugins"),
            disabled: Vec::new(),
            hook_timeout_secs: default_hook_timeout(),
            shadow_directory: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bot: BotConfig {
                name: "carik-bot".to_string(),
                prefix: "/".to_string(),
            },
            plugins: PluginConfig::default(),
        }
    }
}

impl Config {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)?;

        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(content)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(self)
            .map_err(|e| ConfigError::Parse(format!("Failed to serialize config: {}", e)))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.plugins.directory.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue("plugins.directory must not be empty".to_string()));
        }
        if let Some(blank) = self.plugins.disabled.iter().find(|name| name.trim().is_empty()) {
            return Err(ConfigError::InvalidValue(format!("plugins.disabled contains a blank entry: {:?}", blank)));
        }
        Ok(())
    }

    pub fn load_env() -> Self {
        // Load from environment variables
        let mut config = Config::default();

        if let Ok(dir) = std::env::var("CARIK_PLUGINS_DIR") {
            config.plugins.directory = PathBuf::from(dir);
        }

        if let Ok(disabled) = std::env::var("CARIK_DISABLED_PLUGINS") {
            config.plugins.disabled = disabled
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect();
        }

        config
    }
}
