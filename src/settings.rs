// ============================================================================
// PERSISTENT SETTINGS: API credentials, endpoint, UI defaults
// ============================================================================

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::ops::prompt::AspectRatio;

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-image-preview";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Environment variables checked (in order) before the stored key.
pub const API_KEY_ENV_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

const SETTINGS_FILE: &str = "photostudio_settings.toml";

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("no settings directory could be determined")]
    NoConfigDir,
    #[error("could not write settings to '{}': {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudioSettings {
    /// Stored key; an API key environment variable takes precedence.
    pub api_key: String,
    pub api_base: String,
    pub model: String,
    pub request_timeout_secs: u64,
    pub default_aspect_ratio: AspectRatio,
    pub default_brush_size: f32,
    /// Last directory used by the file dialogs.
    pub last_directory: Option<PathBuf>,
}

impl Default for StudioSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: DEFAULT_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            default_aspect_ratio: AspectRatio::default(),
            default_brush_size: crate::ops::mask::DEFAULT_BRUSH_SIZE,
            last_directory: None,
        }
    }
}

impl StudioSettings {
    /// Path to the settings file.
    /// On Linux:   ~/.config/photostudio/photostudio_settings.toml  (XDG_CONFIG_HOME respected)
    /// On Windows: %APPDATA%\PhotoStudio\photostudio_settings.toml
    /// On macOS:   ~/Library/Application Support/PhotoStudio/photostudio_settings.toml
    pub fn settings_path() -> Option<PathBuf> {
        #[cfg(target_os = "windows")]
        {
            let appdata = std::env::var("APPDATA")
                .or_else(|_| std::env::var("USERPROFILE"))
                .ok()?;
            Some(PathBuf::from(appdata).join("PhotoStudio").join(SETTINGS_FILE))
        }
        #[cfg(target_os = "macos")]
        {
            let home = std::env::var("HOME").ok()?;
            Some(
                PathBuf::from(home)
                    .join("Library")
                    .join("Application Support")
                    .join("PhotoStudio")
                    .join(SETTINGS_FILE),
            )
        }
        #[cfg(not(any(target_os = "windows", target_os = "macos")))]
        {
            let config_dir = std::env::var("XDG_CONFIG_HOME")
                .map(PathBuf::from)
                .or_else(|_| std::env::var("HOME").map(|h| PathBuf::from(h).join(".config")))
                .ok()?;
            Some(config_dir.join("photostudio").join(SETTINGS_FILE))
        }
    }

    /// For messages shown to the user.
    pub fn display_path() -> String {
        Self::settings_path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| SETTINGS_FILE.to_string())
    }

    /// Load settings from disk (returns defaults if the file is missing or corrupt).
    pub fn load() -> Self {
        match Self::settings_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    pub fn load_from(path: &Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        match toml::from_str(&content) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("ignoring unreadable settings file {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn save(&self) -> Result<(), SettingsError> {
        let path = Self::settings_path().ok_or(SettingsError::NoConfigDir)?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        let text = toml::to_string_pretty(self)?;
        let write = |source| SettingsError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write)?;
        }
        std::fs::write(path, text).map_err(write)?;
        log::info!("settings saved to {}", path.display());
        Ok(())
    }

    /// Key from the environment, else the stored one. `None` when neither is set.
    pub fn effective_api_key(&self) -> Option<String> {
        let from_env = API_KEY_ENV_VARS
            .iter()
            .find_map(|name| std::env::var(name).ok());
        pick_api_key(from_env, &self.api_key)
    }
}

fn pick_api_key(from_env: Option<String>, stored: &str) -> Option<String> {
    from_env
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .or_else(|| Some(stored.trim().to_string()).filter(|k| !k.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_key_wins_over_stored() {
        assert_eq!(pick_api_key(Some("env".into()), "file"), Some("env".into()));
        assert_eq!(pick_api_key(Some("  ".into()), "file"), Some("file".into()));
        assert_eq!(pick_api_key(None, " file "), Some("file".into()));
        assert_eq!(pick_api_key(None, ""), None);
    }

    #[test]
    fn round_trips_through_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(SETTINGS_FILE);
        let settings = StudioSettings {
            api_key: "abc".into(),
            default_aspect_ratio: AspectRatio::Landscape,
            default_brush_size: 25.0,
            last_directory: Some(PathBuf::from("/tmp/pictures")),
            ..StudioSettings::default()
        };
        settings.save_to(&path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("default_aspect_ratio = \"16:9\""));
        assert_eq!(StudioSettings::load_from(&path), settings);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        std::fs::write(&path, "model = \"custom-model\"\n").unwrap();
        let loaded = StudioSettings::load_from(&path);
        assert_eq!(loaded.model, "custom-model");
        assert_eq!(loaded.api_base, DEFAULT_API_BASE);
        assert_eq!(loaded.request_timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn corrupt_or_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        assert_eq!(StudioSettings::load_from(&path), StudioSettings::default());
        std::fs::write(&path, "this is = = not toml").unwrap();
        assert_eq!(StudioSettings::load_from(&path), StudioSettings::default());
    }
}
