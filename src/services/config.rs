use crate::error::ConfigError;
use crate::models::config::AppConfig;
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration manager for app settings
pub struct ConfigManager {
    config_dir: PathBuf,
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a ConfigManager for the platform config directory
    /// (`<config_dir>/img2text/config.json`).
    ///
    /// The directory is created on first save, not here.
    pub fn new() -> Result<Self, ConfigError> {
        let config_dir = dirs::config_dir()
            .ok_or(ConfigError::NoConfigDir)?
            .join("img2text");

        Ok(Self::with_dir(config_dir))
    }

    /// Use an explicit config directory
    pub fn with_dir(config_dir: PathBuf) -> Self {
        let config_path = config_dir.join("config.json");
        Self {
            config_dir,
            config_path,
        }
    }

    /// Use an explicit config file path
    pub fn with_file(config_path: PathBuf) -> Self {
        let config_dir = config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Self {
            config_dir,
            config_path,
        }
    }

    fn io_error(&self, source: std::io::Error) -> ConfigError {
        ConfigError::Io {
            path: self.config_path.display().to_string(),
            source,
        }
    }

    /// Save configuration to disk
    pub fn save(&self, config: &AppConfig) -> Result<(), ConfigError> {
        config.validate()?;

        fs::create_dir_all(&self.config_dir).map_err(|e| self.io_error(e))?;

        // Pretty print for human editing
        let json = serde_json::to_string_pretty(config)?;
        fs::write(&self.config_path, json).map_err(|e| self.io_error(e))?;

        tracing::debug!(path = %self.config_path.display(), "Saved config");
        Ok(())
    }

    /// Load configuration from disk
    ///
    /// If config file doesn't exist, returns default configuration
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        if !self.config_exists() {
            return Ok(AppConfig::default());
        }

        let content = fs::read_to_string(&self.config_path).map_err(|e| self.io_error(e))?;
        let config: AppConfig = serde_json::from_str(&content)?;
        config.validate()?;

        Ok(config)
    }

    /// Get the config file path
    pub fn config_file_path(&self) -> &PathBuf {
        &self.config_path
    }

    /// Check if config file exists
    pub fn config_exists(&self) -> bool {
        self.config_path.exists()
    }
}
