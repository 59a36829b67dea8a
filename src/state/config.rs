//! Configuration management

use crate::speech::Backend;
use crate::{Result, TrainerError};
use ini::Ini;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application configuration
///
/// Stored in ~/.ptrain.cfg. Holds engine selection and timing knobs;
/// the phrase list itself lives in the data directory, not here.
pub struct Config {
    /// INI configuration storage
    ini: Ini,

    /// Config file path
    path: PathBuf,
}

impl Config {
    /// Load configuration from ~/.ptrain.cfg, creating it if missing
    pub fn load() -> Result<Self> {
        Self::load_from(Self::config_path())
    }

    /// Load configuration from `path`, creating it with defaults if missing
    pub fn load_from(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        debug!("Loading config from {:?}", path);

        let ini = if path.exists() {
            Ini::load_from_file(&path)
                .map_err(|e| TrainerError::IniParse(format!("Failed to load config: {}", e)))?
        } else {
            info!("Config file not found, creating default");
            let default = Self::default_config();
            default
                .write_to_file(&path)
                .map_err(|e| TrainerError::IniParse(format!("Failed to write config: {}", e)))?;
            default
        };

        Ok(Self { ini, path })
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        debug!("Saving config to {:?}", self.path);
        self.ini
            .write_to_file(&self.path)
            .map_err(|e| TrainerError::Config(format!("Failed to save config: {}", e)))
    }

    /// Get config file path (~/.ptrain.cfg)
    fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".ptrain.cfg")
    }

    /// Expose the config file path for display
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create default configuration
    fn default_config() -> Ini {
        let mut ini = Ini::new();

        ini.with_section(Some("speech"))
            .set("backend", "auto")
            .set("words_per_minute", "150");

        ini.with_section(Some("trainer"))
            .set("tick_ms", "100")
            .set("notice_ms", "1800")
            .set("data_dir", "");

        ini
    }

    /// Get a string value from config
    pub fn get_string(&self, section: &str, key: &str, default: &str) -> String {
        self.ini
            .get_from(Some(section), key)
            .unwrap_or(default)
            .to_string()
    }

    /// Get an integer value from config
    pub fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.ini
            .get_from(Some(section), key)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }

    /// Get a float value from config
    pub fn get_float(&self, section: &str, key: &str, default: f32) -> f32 {
        self.ini
            .get_from(Some(section), key)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }

    /// Set a value in config
    pub fn set(&mut self, section: &str, key: &str, value: &str) {
        self.ini.with_section(Some(section)).set(key, value);
    }

    /// Speech backend to use
    ///
    /// Unknown names fall back to auto-detection.
    pub fn backend(&self) -> Backend {
        let name = self.get_string("speech", "backend", "auto");
        Backend::from_name(&name).unwrap_or_else(|| {
            warn!("Unknown speech backend {:?}, using auto", name);
            Backend::Auto
        })
    }

    /// Assumed speaking speed for progress estimates
    pub fn words_per_minute(&self) -> f32 {
        let wpm = self.get_float("speech", "words_per_minute", 150.0);
        if wpm > 0.0 {
            wpm
        } else {
            150.0
        }
    }

    /// Progress telemetry cadence
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.get_int("trainer", "tick_ms", 100).clamp(10, 1000) as u64)
    }

    /// How long status notices stay up
    pub fn notice_duration(&self) -> Duration {
        Duration::from_millis(self.get_int("trainer", "notice_ms", 1800).clamp(0, 60_000) as u64)
    }

    /// Directory holding saved phrases, `None` for the platform default
    pub fn data_dir(&self) -> Option<PathBuf> {
        let dir = self.get_string("trainer", "data_dir", "");
        let dir = dir.trim();
        (!dir.is_empty()).then(|| PathBuf::from(dir))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_written_on_first_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ptrain.cfg");

        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.backend(), Backend::Auto);
        assert_eq!(config.words_per_minute(), 150.0);
        assert_eq!(config.tick_interval(), Duration::from_millis(100));
        assert_eq!(config.notice_duration(), Duration::from_millis(1800));
        assert_eq!(config.data_dir(), None);
    }

    #[test]
    fn test_bad_values_fall_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ptrain.cfg");
        std::fs::write(
            &path,
            "[speech]\nbackend=festival\nwords_per_minute=-3\n[trainer]\ntick_ms=abc\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.backend(), Backend::Auto);
        assert_eq!(config.words_per_minute(), 150.0);
        assert_eq!(config.tick_interval(), Duration::from_millis(100));
    }

    #[test]
    fn test_set_and_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ptrain.cfg");

        let mut config = Config::load_from(&path).unwrap();
        config.set("speech", "backend", "silent");
        config.set("trainer", "data_dir", "/tmp/phrases");
        config.save().unwrap();

        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded.backend(), Backend::Silent);
        assert_eq!(reloaded.data_dir(), Some(PathBuf::from("/tmp/phrases")));
    }
}
