// yt-dlp engine - drives the yt-dlp binary as a subprocess
//
// Metadata extraction uses --dump-json; downloads stream progress
// through --progress-template as one JSON object per line, parsed into
// RawProgress for the orchestrator's hook.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use log::{debug, info, warn};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tokio::time::{timeout, Duration};

use crate::errors::DownloadError;
use crate::models::{MediaInfo, RawProgress};
use crate::options::{FetchOptions, Postprocessor};
use crate::tools;
use crate::traits::{ProgressHook, VideoEngine};

const EXTRACT_TIMEOUT_SECS: u64 = 120;
const CACHE_CLEAR_TIMEOUT_SECS: u64 = 30;

pub struct YtDlpEngine {
    bin: PathBuf,
}

impl YtDlpEngine {
    /// Locate the yt-dlp binary, falling back to a bare name resolved
    /// via PATH at spawn time.
    pub fn discover() -> Self {
        let bin = tools::find_ytdlp().unwrap_or_else(|| PathBuf::from("yt-dlp"));
        debug!("yt-dlp binary: {}", bin.display());
        Self { bin }
    }

    pub fn with_binary(bin: PathBuf) -> Self {
        Self { bin }
    }

    /// CLI arguments shared by metadata extraction and download
    fn common_args(opts: &FetchOptions) -> Vec<String> {
        let mut args = Vec::new();

        if opts.quiet {
            args.push("--no-warnings".to_string());
        }
        if opts.no_playlist {
            args.push("--no-playlist".to_string());
        }
        if opts.geo_bypass {
            args.push("--geo-bypass".to_string());
        }
        if !opts.call_home {
            args.push("--no-update".to_string());
        }
        // Certificate checks stay on and insecure transports stay off;
        // yt-dlp only takes flags for the unsafe direction.
        if !opts.check_certificates {
            args.push("--no-check-certificates".to_string());
        }
        if opts.prefer_insecure {
            args.push("--prefer-insecure".to_string());
        }

        args.push("--user-agent".to_string());
        args.push(opts.user_agent.clone());
        args.push("--referer".to_string());
        args.push(opts.referer.clone());

        if let Some(cookies) = &opts.cookie_file {
            args.push("--cookies".to_string());
            args.push(cookies.to_string_lossy().into_owned());
        }
        args
    }

    /// Full argument list for a download run
    fn download_args(url: &str, opts: &FetchOptions) -> Vec<String> {
        let mut args = Self::common_args(opts);

        args.push("-f".to_string());
        args.push(opts.selector.clone());
        args.push("-o".to_string());
        args.push(opts.output_template.to_string_lossy().into_owned());

        if let Some(merge) = &opts.merge_format {
            args.push("--merge-output-format".to_string());
            args.push(merge.clone());
        }
        if opts.restrict_filenames {
            args.push("--restrict-filenames".to_string());
        }
        args.push("--trim-filenames".to_string());
        args.push(opts.trim_file_name.to_string());

        if let Some(ffmpeg) = &opts.ffmpeg_location {
            args.push("--ffmpeg-location".to_string());
            args.push(ffmpeg.to_string_lossy().into_owned());
        }

        for pp in &opts.postprocessors {
            match pp {
                Postprocessor::StripMetadata => {
                    args.push("--postprocessor-args".to_string());
                    args.push("ffmpeg:-map_metadata -1".to_string());
                }
                Postprocessor::ExtractAudio { codec, quality } => {
                    args.push("-x".to_string());
                    args.push("--audio-format".to_string());
                    args.push(codec.clone());
                    args.push("--audio-quality".to_string());
                    args.push(quality.clone());
                }
                Postprocessor::ConvertVideo { format } => {
                    args.push("--recode-video".to_string());
                    args.push(format.clone());
                }
            }
        }

        // One machine-readable progress object per line
        args.push("--newline".to_string());
        args.push("--progress-template".to_string());
        args.push("%(progress)j".to_string());

        args.push(url.to_string());
        args
    }

    async fn run_with_timeout(
        &self,
        args: &[String],
        timeout_secs: u64,
    ) -> Result<std::process::Output, DownloadError> {
        let mut child = Command::new(&self.bin)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| DownloadError::ToolNotFound(format!("yt-dlp: {e}")))?;

        let mut stdout_pipe = child
            .stdout
            .take()
            .ok_or_else(|| DownloadError::Unexpected("failed to capture stdout".to_string()))?;
        let mut stderr_pipe = child
            .stderr
            .take()
            .ok_or_else(|| DownloadError::Unexpected("failed to capture stderr".to_string()))?;

        let stdout_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            let _ = stdout_pipe.read_to_end(&mut buf).await;
            buf
        });
        let stderr_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            let _ = stderr_pipe.read_to_end(&mut buf).await;
            buf
        });

        match timeout(Duration::from_secs(timeout_secs), child.wait()).await {
            Ok(status_res) => {
                let status = status_res?;
                let stdout = stdout_task.await.unwrap_or_default();
                let stderr = stderr_task.await.unwrap_or_default();
                Ok(std::process::Output {
                    status,
                    stdout,
                    stderr,
                })
            }
            Err(_) => {
                let _ = child.kill().await;
                stdout_task.abort();
                stderr_task.abort();
                Err(DownloadError::Timeout {
                    tool: "yt-dlp".to_string(),
                    seconds: timeout_secs,
                })
            }
        }
    }
}

/// Parse one stdout line from a download run. Progress-template output
/// is a bare JSON object; everything else is ignored.
fn parse_progress_line(line: &str) -> Option<RawProgress> {
    let trimmed = line.trim();
    if !trimmed.starts_with('{') {
        return None;
    }
    serde_json::from_str(trimmed).ok()
}

#[async_trait]
impl VideoEngine for YtDlpEngine {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    async fn extract_info(
        &self,
        url: &str,
        opts: &FetchOptions,
    ) -> Result<MediaInfo, DownloadError> {
        let mut args = Self::common_args(opts);
        args.push("--dump-json".to_string());
        args.push(url.to_string());

        let output = self.run_with_timeout(&args, EXTRACT_TIMEOUT_SECS).await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DownloadError::Extractor(stderr.trim().to_string()));
        }

        serde_json::from_slice(&output.stdout)
            .map_err(|e| DownloadError::Parse(format!("metadata JSON: {e}")))
    }

    async fn download(
        &self,
        url: &str,
        opts: &FetchOptions,
        hook: ProgressHook<'_>,
    ) -> Result<(), DownloadError> {
        let args = Self::download_args(url, opts);
        debug!("spawning yt-dlp for {url}");

        let mut child = Command::new(&self.bin)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| DownloadError::ToolNotFound(format!("yt-dlp: {e}")))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| DownloadError::Unexpected("failed to capture stdout".to_string()))?;
        let mut stderr_pipe = child
            .stderr
            .take()
            .ok_or_else(|| DownloadError::Unexpected("failed to capture stderr".to_string()))?;

        let stderr_task = tokio::spawn(async move {
            let mut buf = String::new();
            let _ = stderr_pipe.read_to_string(&mut buf).await;
            buf
        });

        let mut lines = BufReader::new(stdout).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if let Some(raw) = parse_progress_line(&line) {
                hook(raw);
            }
        }

        let status = child.wait().await?;
        if status.success() {
            info!("yt-dlp finished for {url}");
            Ok(())
        } else {
            let stderr = stderr_task.await.unwrap_or_default();
            Err(DownloadError::Extractor(stderr.trim().to_string()))
        }
    }

    async fn clear_cache(&self) -> Result<(), DownloadError> {
        let args = vec!["--rm-cache-dir".to_string()];
        let output = self.run_with_timeout(&args, CACHE_CLEAR_TIMEOUT_SECS).await?;
        if output.status.success() {
            info!("yt-dlp cache cleared");
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!("cache clear failed: {}", stderr.trim());
            Err(DownloadError::Extractor(stderr.trim().to_string()))
        }
    }
}
