// Retry-aware fetch orchestrator
//
// Drives the engine through metadata extraction and download with a
// bounded retry budget. The only retryable failure is the auth-wall
// signature (HTTP 403 / login-wall), recovered once by clearing the
// engine's request-signing cache. Every other failure surfaces
// immediately. This function never returns an error past its boundary;
// callers always get exactly one DownloadOutcome.

use std::sync::atomic::{AtomicBool, Ordering};

use log::{error, info, warn};

use crate::config::AppConfig;
use crate::errors::DownloadError;
use crate::formats;
use crate::models::{DownloadOutcome, ProgressEvent};
use crate::options::FetchOptions;
use crate::progress;
use crate::traits::VideoEngine;
use crate::validation::sanitize_title;

/// Retry budget: the initial attempt plus exactly one cache-busting retry
const MAX_ATTEMPTS: usize = 2;

/// Display cap for titles in the outcome
const TITLE_MAX_LEN: usize = 70;

/// Cap for the single-line error message in a failure outcome
const ERROR_MAX_LEN: usize = 100;

pub struct Orchestrator {
    config: AppConfig,
    engine: Box<dyn VideoEngine>,
    in_flight: AtomicBool,
}

/// Releases the in-flight flag when the download future completes or
/// is dropped mid-flight (caller-side cancellation).
struct FlightGuard<'a>(&'a AtomicBool);

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl Orchestrator {
    pub fn new(config: AppConfig, engine: Box<dyn VideoEngine>) -> Self {
        Self {
            config,
            engine,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Convenience constructor wired to the yt-dlp binary
    pub fn with_ytdlp(config: AppConfig) -> Self {
        Self::new(config, Box::new(crate::backends::YtDlpEngine::discover()))
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Download `url` in the format named by `format_key`.
    ///
    /// `progress_sink` receives normalized progress events synchronously
    /// from the engine's I/O context; `info_sink` receives informational
    /// status strings for UI display. Unknown format keys degrade to the
    /// catalog default rather than failing.
    ///
    /// Only one download may run per orchestrator; an overlapping call
    /// returns a failure outcome without touching the active download.
    pub async fn download<P, I>(
        &self,
        url: &str,
        format_key: &str,
        progress_sink: P,
        info_sink: I,
    ) -> DownloadOutcome
    where
        P: Fn(ProgressEvent) + Send + Sync,
        I: Fn(&str) + Send + Sync,
    {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            return DownloadOutcome::failed("a download is already in progress".to_string());
        }
        let _guard = FlightGuard(&self.in_flight);
        self.run_attempts(url, format_key, &progress_sink, &info_sink)
            .await
    }

    async fn run_attempts(
        &self,
        url: &str,
        format_key: &str,
        progress_sink: &(dyn Fn(ProgressEvent) + Send + Sync),
        info_sink: &(dyn Fn(&str) + Send + Sync),
    ) -> DownloadOutcome {
        let mut last_error: Option<DownloadError> = None;

        for attempt in 0..MAX_ATTEMPTS {
            // Rebuilt per attempt so cookie/directory changes apply
            let opts = FetchOptions::for_format(format_key, &self.config);

            if attempt == 0 {
                info_sink("Extracting video information securely...");
            } else {
                info_sink("Retrying with fresh cache...");
            }

            match self
                .attempt(url, format_key, &opts, progress_sink, info_sink)
                .await
            {
                Ok(title) => {
                    if attempt > 0 {
                        info!("retry succeeded on attempt {}", attempt + 1);
                    }
                    return DownloadOutcome::ok(title);
                }
                Err(e) if e.is_auth_wall() && attempt + 1 < MAX_ATTEMPTS => {
                    warn!("auth-wall failure, clearing cache before retry: {e}");
                    info_sink("403 detected, clearing cache and retrying...");
                    // Best-effort; a failed cache clear never changes the outcome
                    if let Err(ce) = self.engine.clear_cache().await {
                        warn!("cache clear failed: {ce}");
                    }
                    last_error = Some(e);
                }
                Err(e) => {
                    error!("download failed: {e}");
                    last_error = Some(e);
                    break;
                }
            }
        }

        let message = last_error
            .map(|e| truncate_error(&e.to_string()))
            .unwrap_or_else(|| "Unknown error".to_string());
        DownloadOutcome::failed(message)
    }

    async fn attempt(
        &self,
        url: &str,
        format_key: &str,
        opts: &FetchOptions,
        progress_sink: &(dyn Fn(ProgressEvent) + Send + Sync),
        info_sink: &(dyn Fn(&str) + Send + Sync),
    ) -> Result<String, DownloadError> {
        let media = self.engine.extract_info(url, opts).await?;
        let title = sanitize_title(&media.title, TITLE_MAX_LEN);

        let desc = formats::resolve(format_key);
        let format_name = desc.container.to_uppercase();
        if desc.audio_only {
            info_sink(&format!("Extracting audio as {format_name}..."));
        } else {
            info_sink(&format!("Downloading as {format_name}..."));
        }

        let hook = |raw| progress_sink(progress::translate(&raw));
        self.engine.download(url, opts, &hook).await?;
        Ok(title)
    }
}

/// First line of an error message, capped for display
fn truncate_error(message: &str) -> String {
    message
        .lines()
        .next()
        .unwrap_or("")
        .chars()
        .take(ERROR_MAX_LEN)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MediaInfo, RawProgress};
    use crate::traits::{ProgressHook, VideoEngine};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::path::PathBuf;
    use std::sync::atomic::AtomicUsize;
    use std::sync::{Arc, Mutex};
    use tokio::sync::Notify;

    const AUTH_WALL: &str = "ERROR: unable to download video data: HTTP Error 403: Forbidden";

    /// Scripted engine: each attempt pops the next outcome
    #[derive(Clone)]
    enum Step {
        Succeed,
        FailExtract(&'static str),
        FailDownload(&'static str),
    }

    struct FakeEngine {
        title: String,
        script: Mutex<VecDeque<Step>>,
        attempts: AtomicUsize,
        cache_clears: AtomicUsize,
        /// Raw payloads emitted during a successful download
        payloads: Vec<RawProgress>,
        /// When set, extract_info blocks until notified (overlap tests)
        gate: Option<Arc<Notify>>,
    }

    impl FakeEngine {
        fn scripted(title: &str, steps: Vec<Step>) -> Self {
            Self {
                title: title.to_string(),
                script: Mutex::new(steps.into()),
                attempts: AtomicUsize::new(0),
                cache_clears: AtomicUsize::new(0),
                payloads: Vec::new(),
                gate: None,
            }
        }
    }

    #[async_trait]
    impl VideoEngine for FakeEngine {
        fn name(&self) -> &'static str {
            "fake"
        }

        async fn extract_info(
            &self,
            _url: &str,
            _opts: &FetchOptions,
        ) -> Result<MediaInfo, DownloadError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            let step = self
                .script
                .lock()
                .unwrap()
                .front()
                .cloned()
                .unwrap_or(Step::Succeed);
            if let Step::FailExtract(msg) = step {
                self.script.lock().unwrap().pop_front();
                return Err(DownloadError::Extractor(msg.to_string()));
            }
            Ok(MediaInfo {
                id: "abc".to_string(),
                title: self.title.clone(),
                uploader: String::new(),
                duration: None,
            })
        }

        async fn download(
            &self,
            _url: &str,
            _opts: &FetchOptions,
            hook: ProgressHook<'_>,
        ) -> Result<(), DownloadError> {
            let step = self
                .script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Step::Succeed);
            match step {
                Step::FailDownload(msg) => Err(DownloadError::Extractor(msg.to_string())),
                _ => {
                    for raw in &self.payloads {
                        hook(raw.clone());
                    }
                    Ok(())
                }
            }
        }

        async fn clear_cache(&self) -> Result<(), DownloadError> {
            self.cache_clears.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn test_config() -> AppConfig {
        AppConfig {
            download_dir: PathBuf::from("/tmp/ytfetch-test"),
            ..AppConfig::default()
        }
    }

    fn orchestrator(engine: FakeEngine) -> (Orchestrator, Arc<FakeEngine>) {
        let engine = Arc::new(engine);
        struct Shared(Arc<FakeEngine>);

        #[async_trait]
        impl VideoEngine for Shared {
            fn name(&self) -> &'static str {
                self.0.name()
            }
            async fn extract_info(
                &self,
                url: &str,
                opts: &FetchOptions,
            ) -> Result<MediaInfo, DownloadError> {
                self.0.extract_info(url, opts).await
            }
            async fn download(
                &self,
                url: &str,
                opts: &FetchOptions,
                hook: ProgressHook<'_>,
            ) -> Result<(), DownloadError> {
                self.0.download(url, opts, hook).await
            }
            async fn clear_cache(&self) -> Result<(), DownloadError> {
                self.0.clear_cache().await
            }
        }

        (
            Orchestrator::new(test_config(), Box::new(Shared(engine.clone()))),
            engine,
        )
    }

    fn no_progress(_: ProgressEvent) {}
    fn no_info(_: &str) {}

    #[tokio::test]
    async fn success_returns_sanitized_title() {
        let (orch, engine) =
            orchestrator(FakeEngine::scripted("Video: Weird/Chars?!", vec![Step::Succeed]));

        let outcome = orch
            .download("https://youtu.be/x", "mp4_720p", no_progress, no_info)
            .await;

        assert!(outcome.success);
        assert_eq!(outcome.title, "Video WeirdChars");
        assert!(outcome.error_message.is_none());
        assert_eq!(engine.attempts.load(Ordering::SeqCst), 1);
        assert_eq!(engine.cache_clears.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn long_title_is_truncated_with_ellipsis() {
        let long = "t".repeat(100);
        let (orch, _) = orchestrator(FakeEngine::scripted(&long, vec![Step::Succeed]));

        let outcome = orch
            .download("https://youtu.be/x", "mp4_720p", no_progress, no_info)
            .await;

        assert!(outcome.success);
        assert_eq!(outcome.title.len(), 73);
        assert!(outcome.title.ends_with("..."));
    }

    #[tokio::test]
    async fn persistent_auth_wall_makes_two_attempts_and_one_cache_clear() {
        let (orch, engine) = orchestrator(FakeEngine::scripted(
            "Title",
            vec![
                Step::FailDownload(AUTH_WALL),
                Step::FailDownload(AUTH_WALL),
            ],
        ));

        let outcome = orch
            .download("https://youtu.be/x", "mp4_720p", no_progress, no_info)
            .await;

        assert!(!outcome.success);
        assert_eq!(engine.attempts.load(Ordering::SeqCst), 2);
        assert_eq!(engine.cache_clears.load(Ordering::SeqCst), 1);
        assert!(outcome.error_message.unwrap().contains("403"));
    }

    #[tokio::test]
    async fn auth_wall_then_success_recovers() {
        let (orch, engine) = orchestrator(FakeEngine::scripted(
            "Recovered Title",
            vec![Step::FailDownload(AUTH_WALL), Step::Succeed],
        ));

        let outcome = orch
            .download("https://youtu.be/x", "mp4_720p", no_progress, no_info)
            .await;

        assert!(outcome.success);
        assert_eq!(outcome.title, "Recovered Title");
        assert_eq!(engine.attempts.load(Ordering::SeqCst), 2);
        assert_eq!(engine.cache_clears.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn auth_wall_during_extraction_also_retries() {
        let (orch, engine) = orchestrator(FakeEngine::scripted(
            "Title",
            vec![Step::FailExtract("Sign in to confirm your age"), Step::Succeed],
        ));

        let outcome = orch
            .download("https://youtu.be/x", "mp4_720p", no_progress, no_info)
            .await;

        assert!(outcome.success);
        assert_eq!(engine.attempts.load(Ordering::SeqCst), 2);
        assert_eq!(engine.cache_clears.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn non_auth_wall_error_never_retries() {
        let (orch, engine) = orchestrator(FakeEngine::scripted(
            "Title",
            vec![Step::FailDownload("Video unavailable")],
        ));

        let outcome = orch
            .download("https://youtu.be/x", "mp4_720p", no_progress, no_info)
            .await;

        assert!(!outcome.success);
        assert_eq!(engine.attempts.load(Ordering::SeqCst), 1);
        assert_eq!(engine.cache_clears.load(Ordering::SeqCst), 0);
        assert_eq!(outcome.error_message.as_deref(), Some("Video unavailable"));
    }

    #[tokio::test]
    async fn error_message_is_first_line_capped_at_one_hundred_chars() {
        let long_first = "x".repeat(150);
        let msg: &'static str =
            Box::leak(format!("{long_first}\nsecond line detail").into_boxed_str());
        let (orch, _) = orchestrator(FakeEngine::scripted("Title", vec![Step::FailDownload(msg)]));

        let outcome = orch
            .download("https://youtu.be/x", "mp4_720p", no_progress, no_info)
            .await;

        let err = outcome.error_message.unwrap();
        assert_eq!(err.len(), 100);
        assert!(!err.contains("second line"));
    }

    #[tokio::test]
    async fn progress_events_are_translated_and_ordered() {
        let mut engine = FakeEngine::scripted("Title", vec![Step::Succeed]);
        engine.payloads = vec![
            RawProgress {
                status: "downloading".to_string(),
                downloaded_bytes: Some(50.0),
                total_bytes: Some(200.0),
                ..RawProgress::default()
            },
            RawProgress {
                status: "finished".to_string(),
                ..RawProgress::default()
            },
        ];
        let (orch, _) = orchestrator(engine);

        let events: Arc<Mutex<Vec<ProgressEvent>>> = Arc::new(Mutex::new(Vec::new()));
        let sink_events = events.clone();
        let outcome = orch
            .download(
                "https://youtu.be/x",
                "mp4_720p",
                move |e| sink_events.lock().unwrap().push(e),
                no_info,
            )
            .await;

        assert!(outcome.success);
        let events = events.lock().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].percentage, 25.0);
        assert_eq!(events[1].percentage, 100.0);
    }

    #[tokio::test]
    async fn info_messages_announce_extraction_and_retry() {
        let (orch, _) = orchestrator(FakeEngine::scripted(
            "Title",
            vec![Step::FailDownload(AUTH_WALL), Step::Succeed],
        ));

        let messages: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = messages.clone();
        orch.download("https://youtu.be/x", "flac", no_progress, move |m| {
            sink.lock().unwrap().push(m.to_string())
        })
        .await;

        let messages = messages.lock().unwrap();
        assert!(messages[0].contains("Extracting video information"));
        assert!(messages.iter().any(|m| m.contains("Retrying with fresh cache")));
        assert!(messages.iter().any(|m| m.contains("Extracting audio as FLAC")));
    }

    #[tokio::test]
    async fn unknown_format_key_degrades_to_default() {
        let (orch, _) = orchestrator(FakeEngine::scripted("Title", vec![Step::Succeed]));

        let outcome = orch
            .download("https://youtu.be/x", "no_such_format", no_progress, no_info)
            .await;

        assert!(outcome.success);
    }

    #[tokio::test]
    async fn overlapping_download_is_refused() {
        let gate = Arc::new(Notify::new());
        let mut engine = FakeEngine::scripted("Title", vec![Step::Succeed]);
        engine.gate = Some(gate.clone());
        let (orch, _) = orchestrator(engine);
        let orch = Arc::new(orch);

        let first = {
            let orch = orch.clone();
            tokio::spawn(async move {
                orch.download("https://youtu.be/x", "mp4_720p", no_progress, no_info)
                    .await
            })
        };
        // Let the first call park inside extract_info
        tokio::task::yield_now().await;

        let second = orch
            .download("https://youtu.be/y", "mp4_720p", no_progress, no_info)
            .await;
        assert!(!second.success);
        assert!(second
            .error_message
            .unwrap()
            .contains("already in progress"));

        gate.notify_one();
        let first = first.await.unwrap();
        assert!(first.success);
    }

    #[tokio::test]
    async fn cancelled_download_releases_the_guard() {
        let gate = Arc::new(Notify::new());
        let mut engine = FakeEngine::scripted("Title", vec![Step::Succeed]);
        engine.gate = Some(gate.clone());
        let (orch, _) = orchestrator(engine);
        let orch = Arc::new(orch);

        let first = {
            let orch = orch.clone();
            tokio::spawn(async move {
                orch.download("https://youtu.be/x", "mp4_720p", no_progress, no_info)
                    .await
            })
        };
        // Park the first call inside extract_info, then cancel it the
        // way a caller would: drop the future via abort.
        tokio::task::yield_now().await;
        first.abort();
        assert!(first.await.unwrap_err().is_cancelled());

        // A later call must proceed, not be refused by a stale flag.
        gate.notify_one();
        let outcome = orch
            .download("https://youtu.be/x", "mp4_720p", no_progress, no_info)
            .await;
        assert!(outcome.success);
    }
}
