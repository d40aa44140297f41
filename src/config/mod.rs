//! Application configuration and data directories
//!
//! The suite keeps its settings, logs and saved workflows under the
//! per-user application data directory.

use anyhow::{anyhow, Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "config.toml";
const WORKFLOWS_DIR_NAME: &str = "workflows";
const LOGS_DIR_NAME: &str = "logs";

/// Root application data directory for the current user.
pub fn app_root() -> Result<PathBuf> {
    ProjectDirs::from("", "", "SanitySuite")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| anyhow!("could not determine application data directory"))
}

/// Ensure the application data directory structure exists.
pub fn ensure_app_dirs() -> Result<PathBuf> {
    let root = app_root()?;
    fs::create_dir_all(root.join(LOGS_DIR_NAME))
        .with_context(|| format!("failed to create {}", root.join(LOGS_DIR_NAME).display()))?;
    fs::create_dir_all(root.join(WORKFLOWS_DIR_NAME)).with_context(|| {
        format!("failed to create {}", root.join(WORKFLOWS_DIR_NAME).display())
    })?;
    Ok(root)
}

pub fn workflows_dir() -> Result<PathBuf> {
    Ok(app_root()?.join(WORKFLOWS_DIR_NAME))
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub ui: UiConfig,
    pub network: NetworkConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub theme: String,
    pub last_active_tab: String,
    pub default_port: u16,
    pub default_host: String,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            theme: "dark".to_string(),
            last_active_tab: "dashboard".to_string(),
            default_port: 3010,
            default_host: "localhost".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub probe_host: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            probe_host: "https://www.microsoft.com".to_string(),
        }
    }
}

/// Load configuration from a specific path, returning defaults when the
/// file does not exist yet.
pub fn load_config_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("invalid config TOML in {}", path.display()))
}

/// Persist configuration to a specific path.
pub fn save_config_to(config: &Config, path: &Path) -> Result<()> {
    let raw = toml::to_string_pretty(config).context("failed to serialize config")?;
    fs::write(path, raw).with_context(|| format!("failed to write {}", path.display()))
}

/// Load the suite configuration from the application data directory.
pub fn load_config() -> Result<Config> {
    let root = ensure_app_dirs()?;
    load_config_from(&root.join(CONFIG_FILE_NAME))
}

/// Persist the suite configuration to the application data directory.
pub fn save_config(config: &Config) -> Result<()> {
    let root = ensure_app_dirs()?;
    save_config_to(config, &root.join(CONFIG_FILE_NAME))
}
