//! Parser for yt-dlp output
//!
//! The CLI engine asks yt-dlp to print machine-readable lines tagged with the
//! markers below; everything else on stdout is ignored.

use super::traits::{FetchOutcome, ProgressEvent};
use crate::error::FetchError;
use serde::Deserialize;

/// Marker prefixing download progress lines
pub const PROGRESS_MARKER: &str = "media-dl-progress";

/// Marker prefixing post-processor lines
pub const PHASE_MARKER: &str = "media-dl-phase";

/// Marker prefixing the final result line
pub const RESULT_MARKER: &str = "media-dl-result";

/// `--progress-template` for the download stage
pub fn download_progress_template() -> String {
    format!(
        "download:{} %(progress.status)s %(progress.downloaded_bytes)s %(progress.total_bytes)s",
        PROGRESS_MARKER
    )
}

/// `--progress-template` for the post-processing stage
pub fn postprocess_progress_template() -> String {
    format!(
        "postprocess:{} %(progress.postprocessor)s %(progress.status)s",
        PHASE_MARKER
    )
}

/// `--print` template emitted once the file has reached its final name
pub fn result_print_template() -> String {
    format!("after_move:{} %(.{{ext,title}})j", RESULT_MARKER)
}

/// Parse a single stdout line into a progress event
///
/// Returns `None` for lines that are not progress lines, and for
/// post-processor updates other than the start of a phase.
pub fn parse_progress_line(line: &str) -> Option<ProgressEvent> {
    let line = line.trim();

    if let Some(rest) = strip_marker(line, PROGRESS_MARKER) {
        let mut fields = rest.split_whitespace();
        let status = fields.next()?;
        let downloaded = fields.next().and_then(parse_counter);
        let total = fields.next().and_then(parse_counter);
        return Some(ProgressEvent::from_raw(status, downloaded, total));
    }

    if let Some(rest) = strip_marker(line, PHASE_MARKER) {
        let mut fields = rest.split_whitespace();
        let name = fields.next()?;
        let status = fields.next().unwrap_or("started");
        if status != "started" || name == "NA" {
            return None;
        }
        return Some(ProgressEvent::Phase {
            name: name.to_string(),
            percent: 0.0,
        });
    }

    None
}

#[derive(Deserialize)]
struct ResultLine {
    ext: Option<String>,
    title: Option<String>,
}

/// Parse the final result line printed after the file is moved into place
pub fn parse_result_line(line: &str) -> Option<FetchOutcome> {
    let rest = strip_marker(line.trim(), RESULT_MARKER)?;
    let parsed: ResultLine = serde_json::from_str(rest.trim()).ok()?;
    Some(FetchOutcome {
        extension: parsed.ext.filter(|e| !e.is_empty()),
        title: parsed.title,
    })
}

/// Map a failed run onto a [`FetchError`] using the engine's stderr
pub fn classify_failure(stderr: &str) -> FetchError {
    let message = last_error_line(stderr);
    let lower = stderr.to_lowercase();

    if lower.contains("unsupported url") || lower.contains("is not a valid url") {
        FetchError::UnsupportedUrl(message)
    } else if lower.contains("no space left") || lower.contains("permission denied") {
        FetchError::Disk(message)
    } else if lower.contains("unable to download webpage")
        || lower.contains("urlopen error")
        || lower.contains("connection")
        || lower.contains("network is unreachable")
        || lower.contains("name resolution")
        || lower.contains("http error 5")
    {
        FetchError::Network(message)
    } else {
        FetchError::Engine(message)
    }
}

/// Last `ERROR:` line of the output, or its last non-empty line
fn last_error_line(stderr: &str) -> String {
    let lines: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    lines
        .iter()
        .rev()
        .find(|l| l.starts_with("ERROR:"))
        .or_else(|| lines.last())
        .map(|l| l.trim_start_matches("ERROR:").trim().to_string())
        .unwrap_or_else(|| "engine exited without output".to_string())
}

fn strip_marker<'a>(line: &'a str, marker: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(marker)?;
    if rest.is_empty() || rest.starts_with(char::is_whitespace) {
        Some(rest)
    } else {
        None
    }
}

/// yt-dlp prints `NA` for unknown values and sometimes floats for byte counts
fn parse_counter(field: &str) -> Option<u64> {
    if let Ok(n) = field.parse::<u64>() {
        return Some(n);
    }
    field
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite() && *n >= 0.0)
        .map(|n| n as u64)
}
