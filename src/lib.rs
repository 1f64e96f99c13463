//! Privacy-minded YouTube download orchestration over yt-dlp.
//!
//! The crate wraps an external extraction/download engine (yt-dlp by
//! default) behind the [`VideoEngine`] trait and drives it through a
//! retry-aware orchestrator: format resolution, per-attempt option
//! building, 403 cache-busting retry, and normalized progress events.
//! Callers supply a URL and a format key and get back exactly one
//! [`DownloadOutcome`]; nothing escapes as an error.
//!
//! The caller (a TUI, GUI or CLI) owns presentation and must run
//! [`Orchestrator::download`] off its responsiveness-critical context;
//! progress sinks fire synchronously from the engine's I/O context.

pub mod backends;
pub mod config;
pub mod cookies;
pub mod errors;
pub mod formats;
pub mod models;
pub mod options;
pub mod orchestrator;
pub mod progress;
pub mod tools;
pub mod traits;
pub mod validation;

pub use backends::YtDlpEngine;
pub use config::AppConfig;
pub use errors::DownloadError;
pub use formats::FormatDescriptor;
pub use models::{DownloadOutcome, MediaInfo, Phase, ProgressEvent, RawProgress};
pub use options::{FetchOptions, Postprocessor};
pub use orchestrator::Orchestrator;
pub use tools::Diagnostics;
pub use traits::{ProgressHook, VideoEngine};
pub use validation::{sanitize_title, validate_youtube_url, UrlError};
