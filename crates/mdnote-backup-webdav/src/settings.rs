//! Endpoint config persistence for the host application.
//!
//! The config lives in a pretty-printed JSON file with the keys `url`,
//! `username`, `password` and `remote_dir`. A missing or unreadable file
//! yields the empty default config so the host can prompt for settings.

use std::path::{Path, PathBuf};

use anyhow::Context;
use mdnote_backup_core::EndpointConfig;
use tracing::{debug, warn};

pub const CONFIG_FILE_NAME: &str = "webdav_config.json";

const APP_DIR: &str = "mdnote";

/// `{config_dir}/mdnote/webdav_config.json`
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join(CONFIG_FILE_NAME)
}

/// `{cache_dir}/mdnote/restore`
pub fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join("restore")
}

/// Load the config, falling back to the default on any problem.
pub fn load_config(path: &Path) -> EndpointConfig {
    if !path.exists() {
        debug!("No config at {}, using defaults", path.display());
        return EndpointConfig::default();
    }

    match read_config(path) {
        Ok(config) => config,
        Err(e) => {
            warn!("Failed to load config from {}: {:#}", path.display(), e);
            EndpointConfig::default()
        }
    }
}

fn read_config(path: &Path) -> anyhow::Result<EndpointConfig> {
    let content = std::fs::read_to_string(path)?;
    let config = serde_json::from_str(&content)?;
    Ok(config)
}

/// Check that a config names a usable HTTP(S) endpoint before saving it.
pub fn validate_endpoint(config: &EndpointConfig) -> anyhow::Result<()> {
    config.require_endpoint()?;
    let url = reqwest::Url::parse(&config.effective_base_url())
        .with_context(|| format!("Invalid WebDAV URL: {}", config.base_url))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => anyhow::bail!("Unsupported URL scheme '{}': use http or https", other),
    }
}

/// Save the config, creating parent directories as needed.
pub fn save_config(path: &Path, config: &EndpointConfig) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let content = serde_json::to_string_pretty(config)?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    debug!("Saved config to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_default() {
        let temp_dir = TempDir::new().unwrap();
        let config = load_config(&temp_dir.path().join(CONFIG_FILE_NAME));
        assert_eq!(config, EndpointConfig::default());
        assert!(!config.is_configured());
    }

    #[test]
    fn test_save_then_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join(CONFIG_FILE_NAME);
        let config = EndpointConfig::new("https://dav.example.com/webdav", "alice", "secret")
            .with_remote_dir("notes");

        save_config(&path, &config).unwrap();
        assert_eq!(load_config(&path), config);

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["url"], "https://dav.example.com/webdav");
        assert_eq!(raw["remote_dir"], "notes");
    }

    #[test]
    fn test_malformed_file_gives_default() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "{ not json").unwrap();

        assert_eq!(load_config(&path), EndpointConfig::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, r#"{"url": "https://h/dav"}"#).unwrap();

        let config = load_config(&path);
        assert_eq!(config.base_url, "https://h/dav");
        assert!(config.username.is_empty());
    }

    #[test]
    fn test_validate_endpoint() {
        let good = EndpointConfig::new("https://dav.example.com/webdav/", "alice", "secret")
            .with_remote_dir("notes");
        assert!(validate_endpoint(&good).is_ok());
        assert!(validate_endpoint(&EndpointConfig::new("http://localhost:8080", "", "")).is_ok());

        let err = validate_endpoint(&EndpointConfig::new("  / ", "alice", "secret")).unwrap_err();
        assert!(err
            .downcast_ref::<mdnote_backup_core::BackupError>()
            .is_some_and(|e| e.requires_configuration()));

        for bad in ["dav.example.com/webdav", "not a url", "ftp://dav.example.com/"] {
            assert!(
                validate_endpoint(&EndpointConfig::new(bad, "alice", "secret")).is_err(),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_default_locations() {
        assert!(default_config_path().ends_with("mdnote/webdav_config.json"));
        assert!(default_cache_dir().ends_with("mdnote/restore"));
    }
}
