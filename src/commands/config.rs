use anyhow::{Context, Result};
use std::io::Write;
use crate::models::config::AppConfig;
use crate::services::config::ConfigManager;

/// Print the effective configuration as JSON
pub fn show_config(manager: &ConfigManager, out: &mut dyn Write) -> Result<()> {
    let config = manager.load().context("Failed to load config")?;
    serde_json::to_writer_pretty(&mut *out, &config).context("Failed to serialize config")?;
    writeln!(out)?;
    Ok(())
}

/// Print the config file location
pub fn config_path(manager: &ConfigManager, out: &mut dyn Write) -> Result<()> {
    writeln!(out, "{}", manager.config_file_path().display())?;
    Ok(())
}

/// Overwrite the config file with defaults
pub fn reset_config(manager: &ConfigManager, out: &mut dyn Write) -> Result<()> {
    manager
        .save(&AppConfig::default())
        .context("Failed to write default config")?;
    writeln!(out, "Config reset: {}", manager.config_file_path().display())?;
    Ok(())
}
