// Persistent configuration (JSON file under the user config dir)

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::errors::DownloadError;
use crate::validation;

/// Caller-facing configuration threaded into the orchestrator.
/// Paths are re-read at the start of every download attempt, so edits
/// made mid-retry take effect on the next attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub download_dir: PathBuf,
    /// Explicit ffmpeg binary path; None means "discover via PATH"
    pub ffmpeg_path: Option<PathBuf>,
    /// Netscape-format cookie file for age-restricted/private videos
    pub cookie_file: Option<PathBuf>,
    /// Last format key the user picked, restored on next launch
    pub last_format: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            download_dir: dirs::download_dir().unwrap_or_else(|| PathBuf::from("./downloads")),
            ffmpeg_path: None,
            cookie_file: None,
            last_format: None,
        }
    }
}

impl AppConfig {
    /// Default config file location: `~/.config/ytfetch/config.json`
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ytfetch")
            .join("config.json")
    }

    /// Load from the default location, falling back to defaults when the
    /// file is missing or unreadable.
    pub fn load() -> Self {
        Self::load_from(&Self::default_path())
    }

    /// Load from an explicit path. A corrupt or missing file yields the
    /// default config rather than an error.
    pub fn load_from(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(cfg) => {
                    debug!("config loaded from {}", path.display());
                    cfg
                }
                Err(e) => {
                    warn!("config file corrupt, using defaults: {e}");
                    Self::default()
                }
            },
            Err(_) => {
                debug!("no config file at {}, using defaults", path.display());
                Self::default()
            }
        }
    }

    /// Update the download directory from caller input (e.g. a
    /// directory picker), rejecting unusable paths up front.
    pub fn set_download_dir(&mut self, path: &str) -> Result<(), DownloadError> {
        if !validation::is_valid_directory_path(path) {
            return Err(DownloadError::InvalidPath(path.to_string()));
        }
        self.download_dir = PathBuf::from(path);
        Ok(())
    }

    pub fn save(&self) -> Result<(), DownloadError> {
        self.save_to(&Self::default_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), DownloadError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(self)
            .map_err(|e| DownloadError::Parse(e.to_string()))?;
        fs::write(path, raw)?;
        debug!("config saved to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");

        let cfg = AppConfig {
            download_dir: PathBuf::from("/tmp/videos"),
            ffmpeg_path: Some(PathBuf::from("/usr/bin/ffmpeg")),
            cookie_file: None,
            last_format: Some("mp4_720p".to_string()),
        };
        cfg.save_to(&path).unwrap();

        let loaded = AppConfig::load_from(&path);
        assert_eq!(loaded.download_dir, PathBuf::from("/tmp/videos"));
        assert_eq!(loaded.last_format.as_deref(), Some("mp4_720p"));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let loaded = AppConfig::load_from(&dir.path().join("nope.json"));
        assert!(loaded.last_format.is_none());
    }

    #[test]
    fn corrupt_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{not json").unwrap();

        let loaded = AppConfig::load_from(&path);
        assert!(loaded.ffmpeg_path.is_none());
    }

    #[test]
    fn set_download_dir_validates_the_path() {
        let mut cfg = AppConfig::default();
        cfg.set_download_dir("/tmp/videos").unwrap();
        assert_eq!(cfg.download_dir, PathBuf::from("/tmp/videos"));

        let before = cfg.download_dir.clone();
        assert!(cfg.set_download_dir("").is_err());
        assert!(cfg.set_download_dir("bad\0path").is_err());
        assert_eq!(cfg.download_dir, before);
    }

    #[test]
    fn save_creates_parent_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("deep").join("config.json");
        AppConfig::default().save_to(&path).unwrap();
        assert!(path.exists());
    }
}
