// Format catalog - static mapping from format keys to download options
//
// Mirrors the formats yt-dlp can produce without per-video probing:
// - MP4 at capped resolutions (no ffmpeg needed below "best")
// - Best-quality containers that require stream merging (ffmpeg)
// - Audio-only extraction targets (always ffmpeg)

/// Immutable descriptor for one user-facing format key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatDescriptor {
    pub key: &'static str,
    /// Output container extension
    pub container: &'static str,
    /// yt-dlp format selector expression, passed through opaquely
    pub selector: &'static str,
    pub audio_only: bool,
    /// Whether ffmpeg is needed (audio extraction or stream merging)
    pub needs_ffmpeg: bool,
    /// UI display label
    pub label: &'static str,
}

const BEST_AV: &str = "bestvideo+bestaudio/best";
const BEST_AUDIO: &str = "bestaudio/best";

/// The full catalog, in the order formats are offered to users.
/// The first entry doubles as the lenient fallback for unknown keys.
pub const CATALOG: [FormatDescriptor; 13] = [
    FormatDescriptor {
        key: "mp4_best",
        container: "mp4",
        selector: BEST_AV,
        audio_only: false,
        needs_ffmpeg: true,
        label: "MP4 (4K/Best)",
    },
    FormatDescriptor {
        key: "mp4_1080p",
        container: "mp4",
        selector: "bestvideo[height<=1080]+bestaudio/best[height<=1080]",
        audio_only: false,
        needs_ffmpeg: false,
        label: "MP4 (1080p)",
    },
    FormatDescriptor {
        key: "mp4_720p",
        container: "mp4",
        selector: "bestvideo[height<=720]+bestaudio/best[height<=720]",
        audio_only: false,
        needs_ffmpeg: false,
        label: "MP4 (720p)",
    },
    FormatDescriptor {
        key: "mp4_480p",
        container: "mp4",
        selector: "bestvideo[height<=480]+bestaudio/best[height<=480]",
        audio_only: false,
        needs_ffmpeg: false,
        label: "MP4 (480p)",
    },
    FormatDescriptor {
        key: "mp4_360p",
        container: "mp4",
        selector: "bestvideo[height<=360]+bestaudio/best[height<=360]",
        audio_only: false,
        needs_ffmpeg: false,
        label: "MP4 (360p)",
    },
    FormatDescriptor {
        key: "mkv_best",
        container: "mkv",
        selector: BEST_AV,
        audio_only: false,
        needs_ffmpeg: true,
        label: "MKV (Best Quality)",
    },
    FormatDescriptor {
        key: "webm_best",
        container: "webm",
        selector: BEST_AV,
        audio_only: false,
        needs_ffmpeg: true,
        label: "WebM (High Compression)",
    },
    FormatDescriptor {
        key: "mov_best",
        container: "mov",
        selector: BEST_AV,
        audio_only: false,
        needs_ffmpeg: true,
        label: "MOV (Apple Compatible)",
    },
    FormatDescriptor {
        key: "flac",
        container: "flac",
        selector: BEST_AUDIO,
        audio_only: true,
        needs_ffmpeg: true,
        label: "Audio Only - FLAC (Lossless)",
    },
    FormatDescriptor {
        key: "wav",
        container: "wav",
        selector: BEST_AUDIO,
        audio_only: true,
        needs_ffmpeg: true,
        label: "Audio Only - WAV (Lossless)",
    },
    FormatDescriptor {
        key: "m4a",
        container: "m4a",
        selector: BEST_AUDIO,
        audio_only: true,
        needs_ffmpeg: true,
        label: "Audio Only - M4A/AAC",
    },
    FormatDescriptor {
        key: "opus",
        container: "opus",
        selector: BEST_AUDIO,
        audio_only: true,
        needs_ffmpeg: true,
        label: "Audio Only - OPUS",
    },
    FormatDescriptor {
        key: "mp3",
        container: "mp3",
        selector: BEST_AUDIO,
        audio_only: true,
        needs_ffmpeg: true,
        label: "Audio Only - MP3",
    },
];

/// Look up a descriptor by key. Unknown keys fall back to the default
/// (mp4, best video + best audio) rather than failing; callers that
/// want strict validation should check the catalog upstream.
pub fn resolve(key: &str) -> &'static FormatDescriptor {
    CATALOG.iter().find(|d| d.key == key).unwrap_or(&CATALOG[0])
}

/// Whether the format needs ffmpeg. Unknown keys inherit the default
/// descriptor's requirement.
pub fn requires_ffmpeg(key: &str) -> bool {
    resolve(key).needs_ffmpeg
}

/// Display label for a key; unknown keys show as the uppercased key
pub fn display_name(key: &str) -> String {
    match CATALOG.iter().find(|d| d.key == key) {
        Some(d) => d.label.to_string(),
        None => key.to_uppercase(),
    }
}

/// Formats that can actually be produced given ffmpeg availability.
/// Without ffmpeg, merging and audio extraction are off the table.
pub fn available(ffmpeg_available: bool) -> Vec<&'static FormatDescriptor> {
    CATALOG
        .iter()
        .filter(|d| ffmpeg_available || !d.needs_ffmpeg)
        .collect()
}

/// ffmpeg audio quality argument for a key: lossless formats get the
/// best setting ("0"), lossy formats a fixed 192 kbps.
pub fn audio_quality(key: &str) -> &'static str {
    match key {
        "flac" | "wav" => "0",
        _ => "192",
    }
}
