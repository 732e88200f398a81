/// Application configuration: load, save, and sanitize.
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Environment variable that overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "QUEST_PAD_CONFIG";

/// Hidden quests older than this no longer show up in the edit history.
const DEFAULT_MAX_UNDO_HISTORY_AGE_SECS: u64 = 12 * 60 * 60;

/// Synced edits older than this are pruned from the local stores.
const DEFAULT_SYNCED_EDITS_RETENTION_SECS: u64 = 7 * 24 * 60 * 60;

const MIN_UNDO_HISTORY_AGE_SECS: u64 = 60;

/// Top-level application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub max_undo_history_age_secs: u64,
    pub synced_edits_retention_secs: u64,
    /// Directory holding the edit database. Empty = platform data directory.
    pub data_dir: String,
    /// `tracing` filter used when `RUST_LOG` is not set.
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            max_undo_history_age_secs: DEFAULT_MAX_UNDO_HISTORY_AGE_SECS,
            synced_edits_retention_secs: DEFAULT_SYNCED_EDITS_RETENTION_SECS,
            data_dir: String::new(),
            log_filter: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Returns the config file path.
    ///
    /// Resolution order:
    /// 1. `QUEST_PAD_CONFIG` environment variable
    /// 2. `quest-pad/quest-pad.json` in the platform config directory
    /// 3. `quest-pad.json` in the working directory
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            return PathBuf::from(path);
        }
        dirs::config_dir()
            .map(|d| d.join("quest-pad").join("quest-pad.json"))
            .unwrap_or_else(|| PathBuf::from("quest-pad.json"))
    }

    /// Loads config from `path`, creating a default file if it doesn't exist.
    /// Returns defaults on any error (missing file, parse error, etc.).
    pub fn load_or_create(path: &Path) -> Self {
        if path.exists() {
            match std::fs::read_to_string(path) {
                Ok(contents) => match serde_json::from_str::<AppConfig>(&contents) {
                    Ok(mut config) => {
                        config.sanitize();
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {}: {e}", path.display());
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {}: {e}", path.display());
                }
            }
            // Return defaults on error (don't overwrite broken file)
            let mut config = Self::default();
            config.sanitize();
            config
        } else {
            let config = Self::default();
            if let Err(e) = config.save(path) {
                tracing::warn!("Failed to create default config at {}: {e}", path.display());
            }
            config
        }
    }

    /// Saves config to `path` as pretty-printed JSON, creating parent
    /// directories as needed.
    pub fn save(&self, path: &Path) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Directory for the edit database.
    ///
    /// Resolution order:
    /// 1. `data_dir` (if non-empty)
    /// 2. `quest-pad/` in the platform data directory
    /// 3. `.data/` in the working directory
    pub fn resolve_data_dir(&self) -> PathBuf {
        if !self.data_dir.is_empty() {
            return PathBuf::from(&self.data_dir);
        }
        dirs::data_dir()
            .map(|d| d.join("quest-pad"))
            .unwrap_or_else(|| PathBuf::from(".data"))
    }

    /// Clamps values to valid ranges and resets invalid fields.
    pub fn sanitize(&mut self) {
        self.max_undo_history_age_secs = self
            .max_undo_history_age_secs
            .max(MIN_UNDO_HISTORY_AGE_SECS);
        self.data_dir = self.data_dir.trim().to_string();
        if self.log_filter.trim().is_empty() {
            self.log_filter = "info".to_string();
        }
    }
}
