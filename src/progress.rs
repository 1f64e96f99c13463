// Progress translation - raw engine payloads to normalized events
//
// The engine reports byte counts whose totals come from different
// fields depending on the extractor; downstream only ever sees a
// clamped percentage, a numeric rate and an optional ETA.

use crate::models::{Phase, ProgressEvent, RawProgress};

/// Translate a raw progress payload into a normalized event. Pure.
///
/// The total is the first available of declared total, estimated total,
/// or filesize; with none present a total of 1 keeps the division
/// defined (and the clamp pins the result to 100). A `finished` payload
/// always reports 100 since muxing/extraction may run after the byte
/// transfer signal peaks.
pub fn translate(raw: &RawProgress) -> ProgressEvent {
    let phase = if raw.status == "finished" {
        Phase::Finished
    } else {
        Phase::Downloading
    };

    let percentage = match phase {
        Phase::Finished => 100.0,
        Phase::Downloading => {
            let total = raw
                .total_bytes
                .or(raw.total_bytes_estimate)
                .or(raw.filesize)
                .filter(|t| *t > 0.0)
                .unwrap_or(1.0);
            let downloaded = raw.downloaded_bytes.unwrap_or(0.0);
            (downloaded / total * 100.0).clamp(0.0, 100.0)
        }
    };

    ProgressEvent {
        phase,
        percentage,
        rate_bytes_per_sec: raw.speed.unwrap_or(0.0).max(0.0),
        eta_seconds: raw.eta.filter(|e| *e >= 0.0).map(|e| e as u64),
    }
}

/// Human-readable transfer rate for display ("1.2 MB/s")
pub fn format_rate(bytes_per_sec: f64) -> String {
    if bytes_per_sec >= 1_048_576.0 {
        format!("{:.1} MB/s", bytes_per_sec / 1_048_576.0)
    } else if bytes_per_sec >= 1024.0 {
        format!("{:.0} KB/s", bytes_per_sec / 1024.0)
    } else {
        format!("{:.0} B/s", bytes_per_sec)
    }
}

/// Human-readable ETA for display ("3:05")
pub fn format_eta(eta_seconds: Option<u64>) -> String {
    match eta_seconds {
        Some(secs) => format!("{}:{:02}", secs / 60, secs % 60),
        None => "--:--".to_string(),
    }
}
