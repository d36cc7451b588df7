//! Configuration management for azflow
//!
//! Locates `azflow.yaml` and loads the provider-wide settings it holds.

pub mod error;
pub mod provider;

pub use error::*;
pub use provider::{FeaturesConfig, ProviderConfig, TimeoutsConfig};

use std::path::{Path, PathBuf};

const APP_DIR: &str = "azflow";
const PROJECT_DIR: &str = ".azflow";
const CONFIG_FILE: &str = "azflow.yaml";
const CONFIG_CANDIDATES: [&str; 2] = ["azflow.local.yaml", CONFIG_FILE];

/// Per-user configuration directory, created on first use
pub fn get_config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or(ConfigError::ConfigDirNotFound)?
        .join(APP_DIR);

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
    }

    Ok(config_dir)
}

/// Find the project's `azflow.yaml`
///
/// Search order:
/// 1. `AZFLOW_CONFIG_PATH` env var (direct path)
/// 2. `project_root`: `azflow.local.yaml`, `azflow.yaml`
/// 3. `project_root/.azflow/` with the same order
/// 4. `~/.config/azflow/azflow.yaml` (global)
pub fn find_config_file(project_root: &Path) -> Result<PathBuf> {
    if let Ok(config_path) = std::env::var("AZFLOW_CONFIG_PATH") {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Ok(path);
        }
    }

    for filename in &CONFIG_CANDIDATES {
        let path = project_root.join(filename);
        if path.exists() {
            return Ok(path);
        }
    }

    let project_dir = project_root.join(PROJECT_DIR);
    if project_dir.is_dir() {
        for filename in &CONFIG_CANDIDATES {
            let path = project_dir.join(filename);
            if path.exists() {
                return Ok(path);
            }
        }
    }

    if let Some(config_dir) = dirs::config_dir() {
        let global_config = config_dir.join(APP_DIR).join(CONFIG_FILE);
        if global_config.exists() {
            return Ok(global_config);
        }
    }

    Err(ConfigError::ConfigFileNotFound)
}

/// Load the provider configuration, falling back to defaults when no file
/// exists anywhere
pub fn load_provider_config(project_root: &Path) -> Result<ProviderConfig> {
    match find_config_file(project_root) {
        Ok(path) => ProviderConfig::load(&path),
        Err(ConfigError::ConfigFileNotFound) => Ok(ProviderConfig::default()),
        Err(e) => Err(e),
    }
}
