//! Engine configuration
//!
//! Settings resolve CLI > environment > TOML config > default, reusing the
//! platform resolution helpers from `nmdp_common::config`.

use nmdp_common::config::{
    default_data_dir, load_toml_config, resolve_database_path, resolve_setting,
};
use nmdp_common::Result;
use std::path::PathBuf;

/// Resolved configuration for one engine invocation
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Platform SQLite database
    pub database_path: PathBuf,
    /// Legacy flat-export directory (one CSV per entity)
    pub export_dir: PathBuf,
    /// Legacy remote platform base URL, if configured
    pub api_url: Option<String>,
    /// Bearer credential for the remote platform, if configured
    pub api_token: Option<String>,
    /// Where audit snapshots are written
    pub audit_dir: PathBuf,
}

impl EngineConfig {
    pub fn resolve(
        database: Option<&str>,
        export_dir: Option<&str>,
        api_url: Option<&str>,
        api_token: Option<&str>,
        audit_dir: Option<&str>,
    ) -> Result<Self> {
        let toml_config = load_toml_config()?;

        let database_path = resolve_database_path(database, &toml_config);

        let export_dir = resolve_setting(
            export_dir,
            "NMDP_LEGACY_EXPORT_DIR",
            toml_config.legacy_export_dir.as_deref(),
        )
        .map(PathBuf::from)
        .unwrap_or_else(|| default_data_dir().join("legacy-export"));

        let api_url = resolve_setting(
            api_url,
            "NMDP_LEGACY_API_URL",
            toml_config.legacy_api_url.as_deref(),
        );
        let api_token = resolve_setting(
            api_token,
            "NMDP_LEGACY_API_TOKEN",
            toml_config.legacy_api_token.as_deref(),
        );

        let audit_dir = resolve_setting(
            audit_dir,
            "NMDP_AUDIT_DIR",
            toml_config.audit_dir.as_deref(),
        )
        .map(PathBuf::from)
        .unwrap_or_else(|| default_data_dir().join("audit"));

        Ok(Self {
            database_path,
            export_dir,
            api_url,
            api_token,
            audit_dir,
        })
    }

    /// True when both remote platform settings are present
    pub fn remote_configured(&self) -> bool {
        self.api_url.is_some() && self.api_token.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_arguments_win() {
        let config = EngineConfig::resolve(
            Some("/tmp/nmdp-test.db"),
            Some("/tmp/export"),
            Some("https://legacy.example"),
            Some("secret"),
            Some("/tmp/audit"),
        )
        .expect("resolve");

        assert_eq!(config.database_path, PathBuf::from("/tmp/nmdp-test.db"));
        assert_eq!(config.export_dir, PathBuf::from("/tmp/export"));
        assert!(config.remote_configured());
    }

    #[test]
    fn remote_requires_url_and_token() {
        let config = EngineConfig::resolve(
            Some("/tmp/nmdp-test.db"),
            Some("/tmp/export"),
            Some("https://legacy.example"),
            None,
            Some("/tmp/audit"),
        )
        .expect("resolve");

        assert!(!config.remote_configured());
    }
}
