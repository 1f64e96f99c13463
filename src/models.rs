// Common data models for the download layer

use serde::{Deserialize, Serialize};

/// Video metadata extracted before a download starts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaInfo {
    #[serde(default)]
    pub id: String,
    #[serde(default = "MediaInfo::unknown_title")]
    pub title: String,
    #[serde(default)]
    pub uploader: String,
    /// Duration in seconds, when the extractor reports one
    #[serde(default)]
    pub duration: Option<f64>,
}

impl MediaInfo {
    fn unknown_title() -> String {
        "Unknown Title".to_string()
    }
}

/// Terminal result of a `download()` call. Produced exactly once per
/// invocation; the orchestrator never returns an error past its boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadOutcome {
    pub success: bool,
    /// Sanitized, display-ready title (empty on failure)
    pub title: String,
    /// First line of the underlying error, capped at 100 characters
    pub error_message: Option<String>,
}

impl DownloadOutcome {
    pub fn ok(title: String) -> Self {
        Self {
            success: true,
            title,
            error_message: None,
        }
    }

    pub fn failed(message: String) -> Self {
        Self {
            success: false,
            title: String::new(),
            error_message: Some(message),
        }
    }
}

/// Download phase as reported by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Downloading,
    /// Byte transfer done; the engine may still be muxing/transcoding
    Finished,
}

/// Normalized progress event delivered to the caller's sink
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub phase: Phase,
    /// Percentage in [0, 100]
    pub percentage: f64,
    pub rate_bytes_per_sec: f64,
    pub eta_seconds: Option<u64>,
}

/// Raw progress payload from the engine's progress hook.
/// Field set mirrors yt-dlp's progress dict; anything absent stays None.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawProgress {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub downloaded_bytes: Option<f64>,
    #[serde(default)]
    pub total_bytes: Option<f64>,
    #[serde(default)]
    pub total_bytes_estimate: Option<f64>,
    #[serde(default)]
    pub filesize: Option<f64>,
    /// Bytes per second
    #[serde(default)]
    pub speed: Option<f64>,
    /// Seconds remaining
    #[serde(default)]
    pub eta: Option<f64>,
}
