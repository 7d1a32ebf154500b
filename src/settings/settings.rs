// Settings management and persistence
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Interface settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterfaceSettings {
    pub theme: String, // "light" or "dark"
}

impl Default for InterfaceSettings {
    fn default() -> Self {
        Self {
            theme: "light".to_string(),
        }
    }
}

/// Playback settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackSettings {
    pub volume: f32, // 0.0 - 1.0
    pub last_track_id: Option<i64>,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            volume: 0.7,
            last_track_id: None,
        }
    }
}

/// Sleep timer settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerSettings {
    pub fade_out_enabled: bool,
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            fade_out_enabled: false,
        }
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    pub version: i32, // Settings schema version for future migrations
    pub interface: InterfaceSettings,
    pub playback: PlaybackSettings,
    pub timer: TimerSettings,
    /// Overrides the default `<app-data>/sounds` directory
    pub sounds_dir: Option<PathBuf>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            version: 1,
            interface: InterfaceSettings::default(),
            playback: PlaybackSettings::default(),
            timer: TimerSettings::default(),
            sounds_dir: None,
        }
    }
}

impl AppSettings {
    /// Get the settings file path
    pub fn get_settings_path(app_dir: &Path) -> PathBuf {
        app_dir.join("settings.json")
    }

    /// Load settings from file. Missing or unreadable settings fall back to
    /// defaults; the store is best-effort key-value only.
    pub fn load(app_dir: &Path) -> Self {
        let path = Self::get_settings_path(app_dir);

        if !path.exists() {
            eprintln!("[Settings] No settings file found, using defaults");
            return Self::default();
        }

        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                eprintln!("[Settings] Failed to read settings file: {}", e);
                return Self::default();
            }
        };

        match serde_json::from_str::<AppSettings>(&content) {
            Ok(settings) => {
                eprintln!("[Settings] Loaded settings from {:?}", path);
                settings
            }
            Err(e) => {
                eprintln!("[Settings] Failed to parse settings, using defaults: {}", e);
                Self::default()
            }
        }
    }

    /// Save settings to file
    pub fn save(&self, app_dir: &Path) -> Result<(), String> {
        // Ensure directory exists
        fs::create_dir_all(app_dir)
            .map_err(|e| format!("Failed to create settings directory: {}", e))?;

        let path = Self::get_settings_path(app_dir);
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize settings: {}", e))?;

        fs::write(&path, content)
            .map_err(|e| format!("Failed to write settings file: {}", e))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = AppSettings::load(dir.path());
        assert_eq!(settings.version, 1);
        assert_eq!(settings.playback.volume, 0.7);
        assert_eq!(settings.interface.theme, "light");
        assert!(!settings.timer.fade_out_enabled);
        assert!(settings.playback.last_track_id.is_none());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();

        let mut settings = AppSettings::default();
        settings.playback.volume = 0.35;
        settings.playback.last_track_id = Some(4);
        settings.interface.theme = "dark".to_string();
        settings.timer.fade_out_enabled = true;

        settings.save(dir.path()).unwrap();
        let loaded = AppSettings::load(dir.path());

        assert_eq!(loaded.playback.volume, 0.35);
        assert_eq!(loaded.playback.last_track_id, Some(4));
        assert_eq!(loaded.interface.theme, "dark");
        assert!(loaded.timer.fade_out_enabled);
    }

    #[test]
    fn garbage_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(AppSettings::get_settings_path(dir.path()), "{not json").unwrap();

        let settings = AppSettings::load(dir.path());
        assert_eq!(settings.playback.volume, 0.7);
    }
}
