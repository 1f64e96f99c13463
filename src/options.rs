// Per-attempt download options
//
// A FetchOptions value is a snapshot: it is rebuilt at the start of
// every retry attempt so that cookie-file or directory changes made by
// the caller mid-retry take effect on the next attempt.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::cookies;
use crate::formats;

/// Realistic browser identity sent with every request (anti-detection)
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
pub const REFERER: &str = "https://www.google.com/";

/// Output filename template; the title is capped at 75 characters to
/// stay clear of filesystem path-length limits.
pub const OUTPUT_TEMPLATE: &str = "%(title).75s.%(ext)s";

/// Hard cap the engine applies to the final filename
pub const TRIM_FILE_NAME: u32 = 150;

/// Typed post-processing directive handed to the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Postprocessor {
    /// Remove embedded metadata from the output file (privacy default)
    StripMetadata,
    /// Extract the audio stream and transcode it
    ExtractAudio {
        codec: String,
        /// ffmpeg quality argument: "0" for lossless targets, kbps otherwise
        quality: String,
    },
    /// Re-mux/transcode video into another container
    ConvertVideo { format: String },
}

/// Options snapshot for one download attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchOptions {
    pub selector: String,
    /// Full output path template under the download directory
    pub output_template: PathBuf,
    /// Merge container for video formats; None for audio extraction
    pub merge_format: Option<String>,
    pub postprocessors: Vec<Postprocessor>,
    pub ffmpeg_location: Option<PathBuf>,
    /// Included only when the file exists on disk at build time
    pub cookie_file: Option<PathBuf>,
    pub user_agent: String,
    pub referer: String,

    // Fixed safety/privacy flags. Kept as explicit fields so the
    // engine mapping and the tests can assert on them.
    pub check_certificates: bool,
    pub prefer_insecure: bool,
    pub call_home: bool,
    pub geo_bypass: bool,
    pub restrict_filenames: bool,
    pub no_playlist: bool,
    pub quiet: bool,
    pub trim_file_name: u32,
}

impl FetchOptions {
    /// Build the options snapshot for a format key and the current config
    pub fn for_format(format_key: &str, config: &AppConfig) -> Self {
        let desc = formats::resolve(format_key);

        // Metadata stripping is unconditional; transcode directives
        // depend on the resolved format.
        let mut postprocessors = vec![Postprocessor::StripMetadata];
        if desc.audio_only {
            postprocessors.push(Postprocessor::ExtractAudio {
                codec: desc.container.to_string(),
                quality: formats::audio_quality(format_key).to_string(),
            });
        } else if desc.container != "mp4" {
            postprocessors.push(Postprocessor::ConvertVideo {
                format: desc.container.to_string(),
            });
        }

        Self {
            selector: desc.selector.to_string(),
            output_template: config.download_dir.join(OUTPUT_TEMPLATE),
            merge_format: (!desc.audio_only).then(|| desc.container.to_string()),
            postprocessors,
            ffmpeg_location: config.ffmpeg_path.clone(),
            cookie_file: cookies::resolve_cookie_file(config.cookie_file.as_deref()),
            user_agent: USER_AGENT.to_string(),
            referer: REFERER.to_string(),
            check_certificates: true,
            prefer_insecure: false,
            call_home: false,
            geo_bypass: true,
            restrict_filenames: true,
            no_playlist: true,
            quiet: true,
            trim_file_name: TRIM_FILE_NAME,
        }
    }
}
