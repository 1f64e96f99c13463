// External tool discovery and diagnostics
//
// ffmpeg availability degrades the offered format set (merging and
// audio extraction need it); yt-dlp absence is fatal for downloads.

use std::path::{Path, PathBuf};
use std::process::Command;

use serde::{Deserialize, Serialize};

use crate::config::AppConfig;

/// Status of one external binary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    pub path: Option<PathBuf>,
    pub version: Option<String>,
    pub is_available: bool,
}

fn detect_tool(binary: &str, version_arg: &str) -> ToolInfo {
    let path = find_binary(binary);
    let version = path
        .as_deref()
        .and_then(|p| probe_version(p, version_arg));
    ToolInfo {
        name: binary.to_string(),
        is_available: path.is_some(),
        path,
        version,
    }
}

/// Look in common install locations first, then fall back to `which`
fn find_binary(name: &str) -> Option<PathBuf> {
    let common_paths = [
        format!("/opt/homebrew/bin/{name}"),
        format!("/usr/local/bin/{name}"),
        format!("/usr/bin/{name}"),
    ];

    for path in common_paths {
        if Path::new(&path).exists() {
            return Some(PathBuf::from(path));
        }
    }

    if let Ok(output) = Command::new("which").arg(name).output() {
        if output.status.success() {
            let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
            if !path.is_empty() {
                return Some(PathBuf::from(path));
            }
        }
    }
    None
}

fn probe_version(path: &Path, arg: &str) -> Option<String> {
    match Command::new(path).arg(arg).output() {
        Ok(output) if output.status.success() => {
            let out = String::from_utf8_lossy(&output.stdout);
            // ffmpeg prints a banner; the version sits before "Copyright"
            let first = out.lines().next()?.trim();
            let version = first.split("Copyright").next().unwrap_or(first).trim();
            Some(version.to_string())
        }
        _ => None,
    }
}

pub fn find_ffmpeg() -> Option<PathBuf> {
    find_binary("ffmpeg")
}

pub fn find_ytdlp() -> Option<PathBuf> {
    find_binary("yt-dlp")
}

pub fn ffmpeg_available(config: &AppConfig) -> bool {
    match &config.ffmpeg_path {
        Some(path) => path.exists(),
        None => find_ffmpeg().is_some(),
    }
}

/// Doctor-style report the caller can render in a diagnostics view
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostics {
    pub ffmpeg: ToolInfo,
    pub ytdlp: ToolInfo,
    pub config_path: PathBuf,
    pub download_dir: PathBuf,
    pub download_dir_exists: bool,
    pub cookie_file: Option<PathBuf>,
}

impl Diagnostics {
    pub fn collect(config: &AppConfig) -> Self {
        let mut ffmpeg = detect_tool("ffmpeg", "-version");
        // An explicitly configured ffmpeg path overrides discovery
        if let Some(path) = &config.ffmpeg_path {
            ffmpeg.is_available = path.exists();
            ffmpeg.version = ffmpeg
                .is_available
                .then(|| probe_version(path, "-version"))
                .flatten();
            ffmpeg.path = Some(path.clone());
        }

        Self {
            ffmpeg,
            ytdlp: detect_tool("yt-dlp", "--version"),
            config_path: AppConfig::default_path(),
            download_dir: config.download_dir.clone(),
            download_dir_exists: config.download_dir.is_dir(),
            cookie_file: crate::cookies::find_cookie_file(config.cookie_file.as_deref()),
        }
    }
}
