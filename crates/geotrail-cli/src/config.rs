//! Configuration file management.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use geotrail_core::DEFAULT_BASE_URL;

/// Seconds between uploads while tracking.
pub const DEFAULT_UPLOAD_INTERVAL: u64 = 60;

/// Seconds between position samples while tracking.
pub const DEFAULT_SAMPLE_INTERVAL: u64 = 30;

/// Configuration file structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Service base URL
    #[serde(default)]
    pub server: Option<String>,

    /// Owner identifier routes are stored under
    #[serde(default)]
    pub owner: Option<String>,

    /// Seconds between uploads while tracking
    #[serde(default)]
    pub upload_interval: Option<u64>,

    /// Seconds between position samples while tracking
    #[serde(default)]
    pub sample_interval: Option<u64>,
}

impl Config {
    /// Get the config file path
    pub fn path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("geotrail")
            .join("config.toml")
    }

    /// Load config from `path`, or the default location.
    ///
    /// A missing file yields the defaults. A file that cannot be read or
    /// parsed is reported as a warning and the defaults are used.
    pub fn load(path: Option<&Path>) -> Self {
        let path = path.map(Path::to_path_buf).unwrap_or_else(Self::path);
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Warning: {:#}", e);
                Self::default()
            }
        }
    }

    /// Load config from a specific file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))
    }

    /// Save config to file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }
}

/// Effective settings after merging flags, environment and the config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub server: String,
    pub owner: Option<String>,
    pub upload_interval: Duration,
    pub sample_interval: Duration,
}

impl Settings {
    /// Flags (and their environment variables) win over the file.
    pub fn resolve(server: Option<String>, owner: Option<String>, config: &Config) -> Self {
        Self {
            server: server
                .or_else(|| config.server.clone())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            owner: owner.or_else(|| config.owner.clone()),
            upload_interval: Duration::from_secs(
                config.upload_interval.unwrap_or(DEFAULT_UPLOAD_INTERVAL),
            ),
            sample_interval: Duration::from_secs(
                config.sample_interval.unwrap_or(DEFAULT_SAMPLE_INTERVAL),
            ),
        }
    }

    /// The owner, or an error explaining how to set one.
    pub fn require_owner(&self) -> Result<&str> {
        match self.owner.as_deref() {
            Some(owner) => Ok(owner),
            None => bail!(
                "No owner specified. Use --owner <ID>, set GEOTRAIL_OWNER, or add `owner = \"<ID>\"` to {}",
                Config::path().display()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config {
            server: Some("http://10.0.0.2:8000".to_string()),
            owner: Some("1".to_string()),
            upload_interval: Some(120),
            sample_interval: None,
        };
        config.save_to(&path).unwrap();

        assert_eq!(Config::load_from(&path).unwrap(), config);
        assert_eq!(Config::load(Some(path.as_path())), config);
    }

    #[test]
    fn test_missing_and_invalid_files_use_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            Config::load(Some(dir.path().join("missing.toml").as_path())),
            Config::default()
        );

        let bad = dir.path().join("bad.toml");
        fs::write(&bad, "server = [").unwrap();
        assert!(Config::load_from(&bad).is_err());
        assert_eq!(Config::load(Some(bad.as_path())), Config::default());
    }

    #[test]
    fn test_settings_precedence() {
        let config = Config {
            server: Some("http://file:8000".to_string()),
            owner: Some("file-owner".to_string()),
            upload_interval: Some(5),
            sample_interval: Some(2),
        };

        let settings = Settings::resolve(Some("http://flag:8000".to_string()), None, &config);
        assert_eq!(settings.server, "http://flag:8000");
        assert_eq!(settings.owner.as_deref(), Some("file-owner"));
        assert_eq!(settings.upload_interval, Duration::from_secs(5));
        assert_eq!(settings.sample_interval, Duration::from_secs(2));

        let settings = Settings::resolve(None, None, &Config::default());
        assert_eq!(settings.server, DEFAULT_BASE_URL);
        assert_eq!(
            settings.upload_interval,
            Duration::from_secs(DEFAULT_UPLOAD_INTERVAL)
        );
        assert!(settings.require_owner().is_err());
    }
}
