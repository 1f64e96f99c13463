// Engine trait definition - the seam between orchestration and yt-dlp

use async_trait::async_trait;

use crate::errors::DownloadError;
use crate::models::{MediaInfo, RawProgress};
use crate::options::FetchOptions;

/// Synchronous progress hook, invoked from the engine's I/O context.
/// Implementations must not block; hand off to the presentation layer
/// via a channel if the caller runs elsewhere.
pub type ProgressHook<'a> = &'a (dyn Fn(RawProgress) + Send + Sync);

/// Contract for the external extraction/download engine.
///
/// The production implementation drives the yt-dlp binary; tests
/// substitute a scripted fake to exercise the retry state machine.
#[async_trait]
pub trait VideoEngine: Send + Sync {
    /// Name of the engine (for logging)
    fn name(&self) -> &'static str;

    /// Fetch metadata for a URL without downloading
    async fn extract_info(
        &self,
        url: &str,
        opts: &FetchOptions,
    ) -> Result<MediaInfo, DownloadError>;

    /// Perform the download, firing the hook zero or more times
    async fn download(
        &self,
        url: &str,
        opts: &FetchOptions,
        hook: ProgressHook<'_>,
    ) -> Result<(), DownloadError>;

    /// Clear the engine's request-signing cache. Best-effort; the
    /// orchestrator swallows failures.
    async fn clear_cache(&self) -> Result<(), DownloadError>;
}
