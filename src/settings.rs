//! User settings for the quota poller
//!
//! Read from `<config_dir>/quota-bar/settings.toml`. A missing file means defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use std::time::Duration;
use thiserror::Error;

use crate::quota_usage::credentials::APP_DIR_NAME;

pub const SETTINGS_FILE_NAME: &str = "settings.toml";

pub const DEFAULT_REFRESH_INTERVAL_MINUTES: u64 = 5;
pub const MIN_REFRESH_INTERVAL_MINUTES: u64 = 1;
pub const MAX_REFRESH_INTERVAL_MINUTES: u64 = 60;

pub const DEFAULT_API_BASE_URL: &str = "https://api.example.com";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,
    #[error("Failed to read settings file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse settings file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Minutes between scheduled refreshes (1-60)
    pub refresh_interval_minutes: u64,
    /// Base URL of the quota API
    pub api_base_url: String,
    /// off, error, warn, info, debug or trace
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            refresh_interval_minutes: DEFAULT_REFRESH_INTERVAL_MINUTES,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from `path`, falling back to defaults when the file is absent
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            log::trace!("Settings file not found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Refresh interval clamped to the supported range
    pub fn refresh_interval_minutes(&self) -> u64 {
        let minutes = self.refresh_interval_minutes;
        if !(MIN_REFRESH_INTERVAL_MINUTES..=MAX_REFRESH_INTERVAL_MINUTES).contains(&minutes) {
            log::warn!(
                "Refresh interval {minutes} out of range, clamped to {MIN_REFRESH_INTERVAL_MINUTES}-{MAX_REFRESH_INTERVAL_MINUTES}"
            );
        }
        minutes.clamp(MIN_REFRESH_INTERVAL_MINUTES, MAX_REFRESH_INTERVAL_MINUTES)
    }

    pub fn log_level_filter(&self) -> log::LevelFilter {
        self.log_level.parse().unwrap_or_else(|_| {
            log::warn!("Unknown log level '{}', using info", self.log_level);
            log::LevelFilter::Info
        })
    }
}

/// Get the default path of the settings file
pub fn default_settings_path() -> Result<PathBuf, ConfigError> {
    let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
    Ok(config_dir.join(APP_DIR_NAME).join(SETTINGS_FILE_NAME))
}

/// Source of the refresh interval, re-read on every configuration change
pub trait SettingsSource: Send + Sync {
    fn refresh_interval(&self) -> Duration;
}

/// Settings backed by a file, reloadable at runtime
pub struct SettingsStore {
    path: PathBuf,
    current: RwLock<Settings>,
}

impl SettingsStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let settings = Settings::load(&path)?;
        Ok(Self {
            path,
            current: RwLock::new(settings),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn current(&self) -> Settings {
        self.current.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Re-read the file; on error the previous settings stay in effect
    pub fn reload(&self) -> Result<Settings, ConfigError> {
        let settings = Settings::load(&self.path)?;
        *self.current.write().unwrap_or_else(|e| e.into_inner()) = settings.clone();
        log::debug!("Reloaded settings: {settings:?}");
        Ok(settings)
    }
}

impl SettingsSource for SettingsStore {
    fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.current().refresh_interval_minutes() * 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load(&dir.path().join(SETTINGS_FILE_NAME)).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.refresh_interval_minutes(), 5);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE_NAME);
        std::fs::write(&path, "refresh_interval_minutes = 15\n").unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.refresh_interval_minutes(), 15);
        assert_eq!(settings.api_base_url, DEFAULT_API_BASE_URL);
    }

    #[test]
    fn test_interval_is_clamped() {
        let mut settings = Settings::default();
        settings.refresh_interval_minutes = 0;
        assert_eq!(settings.refresh_interval_minutes(), 1);
        settings.refresh_interval_minutes = 500;
        assert_eq!(settings.refresh_interval_minutes(), 60);
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE_NAME);
        std::fs::write(&path, "refresh_interval_minutes = \"soon\"").unwrap();

        assert!(matches!(Settings::load(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_store_reload_picks_up_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE_NAME);
        let store = SettingsStore::open(&path).unwrap();
        assert_eq!(store.refresh_interval(), Duration::from_secs(300));

        std::fs::write(&path, "refresh_interval_minutes = 2\n").unwrap();
        store.reload().unwrap();
        assert_eq!(store.refresh_interval(), Duration::from_secs(120));

        // A broken edit keeps the last good settings
        std::fs::write(&path, "refresh_interval_minutes = [").unwrap();
        assert!(store.reload().is_err());
        assert_eq!(store.refresh_interval(), Duration::from_secs(120));
    }

    #[test]
    fn test_log_level_filter() {
        let mut settings = Settings::default();
        assert_eq!(settings.log_level_filter(), log::LevelFilter::Info);
        settings.log_level = "debug".to_string();
        assert_eq!(settings.log_level_filter(), log::LevelFilter::Debug);
        settings.log_level = "chatty".to_string();
        assert_eq!(settings.log_level_filter(), log::LevelFilter::Info);
    }
}
