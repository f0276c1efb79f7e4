//! User settings persistence.
//!
//! Dashboard-wide tunables (advisory threshold, datatile emphasis colors)
//! loaded from and saved to the platform config directory.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::state::{
    Emphasis, DATATILE_ACTIVE_COLOR, DATATILE_INACTIVE_COLOR, PERFORMANCE_ADVISORY_THRESHOLD,
};

/// Errors that can occur while saving settings
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Config directory could not be determined
    #[error("Could not determine config directory")]
    NoConfigDir,

    /// Failed to create the config directory
    #[error("Failed to create config directory: {0}")]
    CreateDirError(String),

    /// Failed to serialize settings
    #[error("Failed to serialize settings: {0}")]
    SerializeError(String),

    /// Failed to write the settings file
    #[error("Failed to write settings file: {0}")]
    WriteError(String),
}

/// Settings that persist across sessions
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Settings file version for migration support
    #[serde(default = "default_version")]
    pub version: u32,
    /// Bin/category count above which a performance advisory is logged
    #[serde(default = "default_threshold")]
    pub performance_advisory_threshold: usize,
    /// Bar color of the chart driving the datatile
    #[serde(default = "default_active_color")]
    pub active_color: String,
    /// Bar color of the other interactive charts
    #[serde(default = "default_inactive_color")]
    pub inactive_color: String,
}

fn default_version() -> u32 {
    1
}

fn default_threshold() -> usize {
    PERFORMANCE_ADVISORY_THRESHOLD
}

fn default_active_color() -> String {
    DATATILE_ACTIVE_COLOR.to_string()
}

fn default_inactive_color() -> String {
    DATATILE_INACTIVE_COLOR.to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            performance_advisory_threshold: default_threshold(),
            active_color: default_active_color(),
            inactive_color: default_inactive_color(),
        }
    }
}

impl Settings {
    /// Get the config directory path
    pub fn get_config_dir() -> Option<PathBuf> {
        #[cfg(target_os = "macos")]
        {
            dirs::data_dir().map(|p| p.join("barfilter"))
        }
        #[cfg(not(target_os = "macos"))]
        {
            dirs::config_dir().map(|p| p.join("barfilter"))
        }
    }

    /// Get the path to the settings JSON file
    pub fn get_settings_path() -> Option<PathBuf> {
        Self::get_config_dir().map(|p| p.join("settings.json"))
    }

    /// Load settings from the default location
    pub fn load() -> Self {
        match Self::get_settings_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load settings from `path`, falling back to defaults when missing or invalid
    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring invalid settings file {:?}: {}", path, e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Save settings to the default location
    pub fn save(&self) -> Result<(), SettingsError> {
        let path = Self::get_settings_path().ok_or(SettingsError::NoConfigDir)?;
        self.save_to(&path)
    }

    /// Save settings to `path`, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| SettingsError::CreateDirError(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| SettingsError::SerializeError(e.to_string()))?;

        std::fs::write(path, content).map_err(|e| SettingsError::WriteError(e.to_string()))
    }

    /// Bar color for an emphasis decision
    pub fn color(&self, emphasis: Emphasis) -> &str {
        match emphasis {
            Emphasis::Active => &self.active_color,
            Emphasis::Inactive => &self.inactive_color,
        }
    }
}
