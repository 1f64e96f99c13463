// URL validation and title sanitization

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

lazy_static! {
    static ref YOUTUBE_URL_RE: Regex =
        Regex::new(r"^(https?://)?(www\.)?(youtube\.com|youtu\.be)/.+$").unwrap();
    // Keep word chars, whitespace, dots and hyphens; drop everything else
    static ref UNSAFE_TITLE_RE: Regex = Regex::new(r"[^\w\s.-]").unwrap();
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlError {
    #[error("please enter a YouTube URL")]
    Empty,

    #[error("URL must be from YouTube")]
    NotYouTube,

    #[error("invalid YouTube URL format")]
    Malformed,
}

/// Validate that a string looks like a YouTube video URL.
/// This is a shape check only; the extractor decides whether the
/// video actually exists.
pub fn validate_youtube_url(url: &str) -> Result<(), UrlError> {
    if url.trim().is_empty() {
        return Err(UrlError::Empty);
    }
    if !url.contains("youtube.com") && !url.contains("youtu.be") {
        return Err(UrlError::NotYouTube);
    }
    if !YOUTUBE_URL_RE.is_match(url) {
        return Err(UrlError::Malformed);
    }
    Ok(())
}

/// Strip characters outside `[\w\s.-]` and cap the length, appending an
/// ellipsis marker when the original exceeded the cap.
pub fn sanitize_title(title: &str, max_length: usize) -> String {
    let cleaned = UNSAFE_TITLE_RE.replace_all(title, "");
    let mut out: String = cleaned.chars().take(max_length).collect();
    if cleaned.chars().count() > max_length {
        out.push_str("...");
    }
    out.trim().to_string()
}

/// Whether a string is usable as a directory path (parseable and
/// expandable, not necessarily existing yet).
pub fn is_valid_directory_path(path: &str) -> bool {
    if path.trim().is_empty() {
        return false;
    }
    !path.contains('\0')
}
