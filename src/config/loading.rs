//! Settings loading.
//!
//! Resolves the settings path (custom `--config` directory or the XDG default),
//! creates a commented default file on first run and parses/validates TOML.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use super::Settings;
use super::validation::validate_settings;
use crate::common::constants::{APP_NAME, SETTINGS_FILE_NAME};
use crate::common::utils::private_path;

/// Configuration directory chosen on the command line, set once at startup
static CONFIG_DIR: OnceLock<Option<PathBuf>> = OnceLock::new();

/// Set the configuration directory for this process.
///
/// Can only be called once; later calls return an error.
pub fn set_config_dir(dir: Option<String>) -> Result<()> {
    CONFIG_DIR
        .set(dir.map(PathBuf::from))
        .map_err(|_| anyhow::anyhow!("Configuration directory already set"))
}

/// The custom configuration directory, if one was given.
pub fn get_custom_config_dir() -> Option<PathBuf> {
    CONFIG_DIR.get().and_then(|d| d.clone())
}

/// Path of `sunswitch.toml`.
pub fn get_config_path() -> Result<PathBuf> {
    if let Some(custom_dir) = get_custom_config_dir() {
        return Ok(custom_dir.join(SETTINGS_FILE_NAME));
    }

    let config_dir = dirs::config_dir().context("Could not determine config directory")?;
    Ok(config_dir.join(APP_NAME).join(SETTINGS_FILE_NAME))
}

/// Load settings, creating a default file first if none exists.
pub fn load() -> Result<Settings> {
    let config_path = get_config_path()?;

    if !config_path.exists() {
        super::builder::create_default_settings(&config_path)
            .context("Failed to create default settings during load")?;
        log_block_start!(
            "Created default settings at {}",
            private_path(&config_path)
        );
    }

    load_from_path(&config_path)
}

/// Load settings from a specific file.
///
/// Does not create anything; a missing file is an error.
pub fn load_from_path(path: &Path) -> Result<Settings> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings from {}", private_path(path)))?;

    let settings: Settings = toml::from_str(&content)
        .with_context(|| format!("Failed to parse settings from {}", private_path(path)))?;

    validate_settings(&settings)
        .with_context(|| format!("Invalid settings in {}", private_path(path)))?;

    Ok(settings)
}
