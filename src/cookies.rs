// Cookie file discovery and validation
//
// Cookies are only needed for age-restricted, private or members-only
// videos. A missing cookie file is never an error; the download simply
// runs unauthenticated.

use std::path::{Path, PathBuf};

use log::{debug, warn};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CookieError {
    #[error("cookie file does not exist")]
    Missing,

    #[error("cookie path is not a file")]
    NotAFile,

    #[error("cookie file is empty")]
    Empty,

    #[error("cookie file has no data lines")]
    NoData,

    #[error("cookie file unreadable: {0}")]
    Unreadable(String),
}

/// Default locations probed when no explicit path is configured
fn default_search_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("cookies.txt")];
    if let Some(cfg) = dirs::config_dir() {
        paths.push(cfg.join("ytfetch").join("cookies.txt"));
    }
    paths
}

/// Find a cookie file. An explicit path wins; if it is set but missing,
/// no fallback search happens (the user asked for that file).
pub fn find_cookie_file(custom: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = custom {
        if path.is_file() {
            debug!("using configured cookie file: {}", path.display());
            return Some(path.to_path_buf());
        }
        warn!("configured cookie file does not exist: {}", path.display());
        return None;
    }

    for path in default_search_paths() {
        if path.is_file() {
            debug!("found cookie file: {}", path.display());
            return Some(path);
        }
    }
    None
}

/// Basic sanity check for a Netscape-format cookie file: it must exist,
/// be a regular file, and contain at least one non-comment line.
pub fn validate_cookie_file(path: &Path) -> Result<(), CookieError> {
    if !path.exists() {
        return Err(CookieError::Missing);
    }
    if !path.is_file() {
        return Err(CookieError::NotAFile);
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| CookieError::Unreadable(e.to_string()))?;
    if content.trim().is_empty() {
        return Err(CookieError::Empty);
    }
    let has_data = content
        .lines()
        .map(str::trim)
        .any(|l| !l.is_empty() && !l.starts_with('#'));
    if !has_data {
        return Err(CookieError::NoData);
    }
    Ok(())
}

/// Resolve the cookie file to hand to the engine: discovered, validated,
/// or None when nothing usable exists.
pub fn resolve_cookie_file(custom: Option<&Path>) -> Option<PathBuf> {
    let path = find_cookie_file(custom)?;
    match validate_cookie_file(&path) {
        Ok(()) => Some(path),
        Err(e) => {
            warn!("ignoring invalid cookie file {}: {e}", path.display());
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn explicit_path_is_used_when_present() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cookies.txt");
        fs::write(&path, "# Netscape HTTP Cookie File\n.youtube.com\tTRUE\t/\tTRUE\t0\tk\tv\n")
            .unwrap();

        assert_eq!(find_cookie_file(Some(&path)), Some(path.clone()));
        assert_eq!(validate_cookie_file(&path), Ok(()));
    }

    #[test]
    fn missing_explicit_path_does_not_fall_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nope.txt");
        assert_eq!(find_cookie_file(Some(&path)), None);
    }

    #[test]
    fn empty_file_is_invalid() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cookies.txt");
        fs::write(&path, "").unwrap();
        assert_eq!(validate_cookie_file(&path), Err(CookieError::Empty));
    }

    #[test]
    fn comments_only_is_invalid() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cookies.txt");
        fs::write(&path, "# Netscape HTTP Cookie File\n# nothing else\n").unwrap();
        assert_eq!(validate_cookie_file(&path), Err(CookieError::NoData));
    }

    #[test]
    fn resolve_drops_invalid_files() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cookies.txt");
        fs::write(&path, "").unwrap();
        assert_eq!(resolve_cookie_file(Some(&path)), None);
    }
}
