//! Configuration loading and data folder resolution
//!
//! Settings resolve in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. OS-dependent compiled default (fallback)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Platform configuration file (`config.toml`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Path to the platform SQLite database
    pub database_path: Option<String>,
    /// Directory holding the legacy flat-export CSV files
    pub legacy_export_dir: Option<String>,
    /// Base URL of the legacy no-code platform API
    pub legacy_api_url: Option<String>,
    /// Bearer credential for the legacy API
    pub legacy_api_token: Option<String>,
    /// Directory for migration audit artifacts
    pub audit_dir: Option<String>,
}

/// Load the platform TOML config from the standard locations.
///
/// Returns the default (all `None`) config when no file exists; a present
/// but unparseable file is an error.
pub fn load_toml_config() -> Result<TomlConfig> {
    let Some(path) = find_config_file() else {
        return Ok(TomlConfig::default());
    };

    let content = std::fs::read_to_string(&path)
        .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))
}

/// Resolve a single string setting through the CLI > env > TOML priority chain.
pub fn resolve_setting(
    cli_arg: Option<&str>,
    env_var_name: &str,
    toml_value: Option<&str>,
) -> Option<String> {
    if let Some(value) = cli_arg {
        return Some(value.to_string());
    }
    if let Ok(value) = std::env::var(env_var_name) {
        if !value.trim().is_empty() {
            return Some(value);
        }
    }
    toml_value.map(|v| v.to_string())
}

/// Resolve the platform database path, falling back to the OS data directory.
pub fn resolve_database_path(
    cli_arg: Option<&str>,
    toml_config: &TomlConfig,
) -> PathBuf {
    resolve_setting(cli_arg, "NMDP_DATABASE", toml_config.database_path.as_deref())
        .map(PathBuf::from)
        .unwrap_or_else(|| default_data_dir().join("nmdp.db"))
}

/// Get default configuration file path for the platform
fn find_config_file() -> Option<PathBuf> {
    if cfg!(target_os = "linux") {
        // Try ~/.config/nmdp/config.toml first, then /etc/nmdp/config.toml
        if let Some(user_config) = dirs::config_dir().map(|d| d.join("nmdp").join("config.toml")) {
            if user_config.exists() {
                return Some(user_config);
            }
        }
        let system_config = PathBuf::from("/etc/nmdp/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
        None
    } else {
        dirs::config_dir()
            .map(|d| d.join("nmdp").join("config.toml"))
            .filter(|p| p.exists())
    }
}

/// Get OS-dependent default data folder path
pub fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("nmdp"))
        .unwrap_or_else(|| PathBuf::from("./nmdp_data"))
}
