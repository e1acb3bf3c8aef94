//! Configuration management for hymnbook
//!
//! Stores settings in ~/.config/hymnbook/config.json

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::store::write_atomic;
use crate::theme::{
    DeviceClass, ThemeRequest, ThemeResolver, DEFAULT_ANIMATION_PROFILE, DEFAULT_COLOR_KEY,
    DEFAULT_VARIANT,
};

pub const DATA_DIR_ENV: &str = "HYMNBOOK_DATA_DIR";

/// Saved look-and-feel choices. Keys are kept as typed so a palette that
/// no longer exists still loads (and resolves to the default).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemePreferences {
    pub dark_mode: bool,
    pub color_key: String,
    pub variant: String,
    pub animation_profile: String,
    pub font_family: Option<String>,
    pub device_class: DeviceClass,
}

impl Default for ThemePreferences {
    fn default() -> Self {
        Self {
            dark_mode: false,
            color_key: DEFAULT_COLOR_KEY.to_string(),
            variant: DEFAULT_VARIANT.to_string(),
            animation_profile: DEFAULT_ANIMATION_PROFILE.to_string(),
            font_family: None,
            device_class: DeviceClass::default(),
        }
    }
}

impl ThemePreferences {
    pub fn to_request(&self) -> ThemeRequest {
        ThemeRequest::new(self.dark_mode, &self.color_key, self.device_class)
            .variant(&self.variant)
            .animation_profile(&self.animation_profile)
            .font_family(self.font_family.as_deref())
    }
}

fn default_theme_cache_capacity() -> usize {
    ThemeResolver::DEFAULT_CAPACITY
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub theme: ThemePreferences,
    /// Maximum number of resolved themes kept in memory
    #[serde(default = "default_theme_cache_capacity")]
    pub theme_cache_capacity: usize,
    /// Where documents (usage, trials, users) are stored
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    /// tracing filter directive, e.g. "hymnbook=debug"
    #[serde(default)]
    pub log_filter: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            theme: ThemePreferences::default(),
            theme_cache_capacity: default_theme_cache_capacity(),
            data_dir: None,
            log_filter: None,
        }
    }
}

impl AppConfig {
    fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("hymnbook"))
    }

    fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("config.json"))
    }

    /// Load config from disk, or return default
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load from an explicit path. Missing file gives defaults; an
    /// unparseable one is moved aside to `config.json.corrupt` first.
    pub fn load_from(path: &Path) -> Self {
        let Ok(content) = fs::read_to_string(path) else {
            return Self::default();
        };
        match serde_json::from_str(&content) {
            Ok(config) => config,
            Err(err) => {
                preserve_corrupt_config(path, &content);
                tracing::warn!(
                    path = %path.display(),
                    error = %err,
                    "config file was corrupted, a backup was saved and defaults were loaded"
                );
                Self::default()
            }
        }
    }

    /// Save config to disk
    pub fn save(&self) -> Result<(), String> {
        let path = Self::config_path()
            .ok_or_else(|| "Could not determine config directory".to_string())?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .map_err(|e| format!("Failed to create config directory: {}", e))?;

            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                if let Err(e) = fs::set_permissions(dir, fs::Permissions::from_mode(0o700)) {
                    tracing::warn!(error = %e, "failed to set config directory permissions");
                }
            }
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize config: {}", e))?;
        write_atomic(path, &content).map_err(|e| format!("Failed to write config: {}", e))?;
        tracing::debug!(path = %path.display(), "config saved");
        Ok(())
    }

    /// Data directory: explicit override, then `HYMNBOOK_DATA_DIR`, then
    /// the configured one, then the platform data dir.
    pub fn data_dir(&self, cli_override: Option<&Path>) -> PathBuf {
        let env_dir = std::env::var_os(DATA_DIR_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        pick_data_dir(cli_override, env_dir, self.data_dir.as_deref())
    }

    pub fn theme_request(&self) -> ThemeRequest {
        self.theme.to_request()
    }

    pub fn config_location() -> String {
        Self::config_path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "~/.config/hymnbook/config.json".to_string())
    }
}

fn pick_data_dir(
    cli_override: Option<&Path>,
    env_dir: Option<PathBuf>,
    configured: Option<&Path>,
) -> PathBuf {
    cli_override
        .map(Path::to_path_buf)
        .or(env_dir)
        .or_else(|| configured.map(Path::to_path_buf))
        .or_else(|| dirs::data_dir().map(|p| p.join("hymnbook")))
        .unwrap_or_else(|| PathBuf::from(".").join("hymnbook"))
}

fn preserve_corrupt_config(path: &Path, content: &str) {
    let corrupt_path = path.with_extension("json.corrupt");
    if fs::rename(path, &corrupt_path).is_err() {
        let _ = fs::write(&corrupt_path, content);
    }
}
