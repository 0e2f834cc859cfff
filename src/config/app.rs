//! Application configuration (`config.json`)
//!
//! Holds where things live on disk and how the session starts. Dashboard
//! settings themselves are not stored here; they live in presets and the
//! session snapshot.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::constants::config::{APP_DIR, FILENAME};

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Where `storage.json` lives (defaults to the platform data dir)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,

    /// Extra directory of premade preset files, loaded next to the bundled ones
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presets_dir: Option<PathBuf>,

    /// Where exported presets are written (defaults to the download dir)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_dir: Option<PathBuf>,

    /// Restore the last session snapshot instead of loading the newest preset
    #[serde(default = "default_resume_session")]
    pub resume_session: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_resume_session() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            data_dir: None,
            presets_dir: None,
            export_dir: None,
            resume_session: default_resume_session(),
        }
    }
}

impl AppConfig {
    pub fn path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(APP_DIR);
        path.push(FILENAME);
        path
    }

    /// Load from the platform config path, writing defaults on first run
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path())
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            info!(path = %config_path.display(), "Config file not found, creating default config");
            let config = AppConfig::default();
            config.save_to(config_path)?;
            return Ok(config);
        }

        let contents = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config from {:?}", config_path))?;

        let mut config: AppConfig = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse JSON from {:?}", config_path))?;
        config.validate_and_clamp();

        info!(path = %config_path.display(), "Loaded config");
        Ok(config)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory {:?}", parent))?;
        }

        let json = serde_json::to_string_pretty(self).context("Failed to serialize config to JSON")?;
        fs::write(config_path, json)
            .with_context(|| format!("Failed to write config to {:?}", config_path))?;

        info!(path = %config_path.display(), "Saved config");
        Ok(())
    }

    fn validate_and_clamp(&mut self) {
        let level = self.log_level.trim().to_lowercase();
        if LOG_LEVELS.contains(&level.as_str()) {
            self.log_level = level;
        } else {
            warn!(log_level = %self.log_level, using = "info", "Unknown log_level, using default");
            self.log_level = default_log_level();
        }
    }

    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| {
            let mut path = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
            path.push(APP_DIR);
            path
        })
    }

    pub fn export_dir(&self) -> PathBuf {
        self.export_dir
            .clone()
            .or_else(dirs::download_dir)
            .unwrap_or_else(|| self.data_dir())
    }
}
