// Error types for the download engine and orchestrator

use thiserror::Error;

/// Message fragments that indicate the remote service rejected the
/// request as unauthenticated/blocked. Clearing the signing cache and
/// retrying once is the known recovery for this signature.
const AUTH_WALL_MARKERS: &[&str] = &["403", "forbidden", "sign in", "login"];

#[derive(Debug, Error)]
pub enum DownloadError {
    /// The extraction/download engine reported a failure for this URL
    #[error("{0}")]
    Extractor(String),

    /// yt-dlp (or another required binary) is not installed
    #[error("tool not found: {0}")]
    ToolNotFound(String),

    /// Subprocess did not finish within its deadline
    #[error("{tool} timed out after {seconds}s")]
    Timeout { tool: String, seconds: u64 },

    /// Failed to parse engine output (JSON metadata or progress line)
    #[error("parse error: {0}")]
    Parse(String),

    /// A caller-supplied filesystem path is not usable
    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl DownloadError {
    /// True when this is an engine-reported failure whose message matches
    /// the auth-wall signature (HTTP 403 / login-wall heuristics).
    /// Only `Extractor` errors qualify; anything else is never retried.
    pub fn is_auth_wall(&self) -> bool {
        match self {
            Self::Extractor(msg) => {
                let lower = msg.to_lowercase();
                AUTH_WALL_MARKERS.iter().any(|m| lower.contains(m))
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_wall_matches_known_signatures() {
        for msg in [
            "ERROR: unable to download video data: HTTP Error 403: Forbidden",
            "Sign in to confirm your age",
            "This video requires LOGIN",
        ] {
            assert!(
                DownloadError::Extractor(msg.to_string()).is_auth_wall(),
                "should classify as auth-wall: {msg}"
            );
        }
    }

    #[test]
    fn other_extractor_errors_are_not_auth_wall() {
        let err = DownloadError::Extractor("Video unavailable".to_string());
        assert!(!err.is_auth_wall());
    }

    #[test]
    fn non_extractor_errors_never_classify_as_auth_wall() {
        // Even if the message happens to contain a marker.
        let err = DownloadError::Unexpected("proxy returned 403".to_string());
        assert!(!err.is_auth_wall());
    }
}
