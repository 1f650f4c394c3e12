//! Traits and types shared by fetch engines

use crate::error::FetchError;
use crate::types::JobId;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Extension assumed when the engine does not report one
pub const DEFAULT_EXTENSION: &str = "mp4";

/// Title assumed when the engine does not report one
pub const DEFAULT_TITLE: &str = "Unknown Title";

/// Channel an engine pushes progress into
pub type ProgressSink = mpsc::Sender<ProgressEvent>;

/// One fetch to perform
#[derive(Debug, Clone)]
pub struct FetchRequest {
    /// Job the artifact belongs to; names the output file
    pub job_id: JobId,
    /// Source URL
    pub url: String,
    /// Directory the artifact is written to
    pub output_dir: PathBuf,
}

impl FetchRequest {
    /// Build a request for `url` writing into `output_dir`
    pub fn new(job_id: JobId, url: impl Into<String>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            job_id,
            url: url.into(),
            output_dir: output_dir.into(),
        }
    }

    /// Output template handed to the engine: `<dir>/<id>.%(ext)s`
    pub fn output_template(&self) -> PathBuf {
        self.output_dir.join(format!("{}.%(ext)s", self.job_id))
    }

    /// Final artifact name for the reported extension
    pub fn file_name(&self, extension: Option<&str>) -> String {
        let ext = extension
            .map(|e| e.trim_start_matches('.'))
            .filter(|e| !e.is_empty())
            .unwrap_or(DEFAULT_EXTENSION);
        format!("{}.{}", self.job_id, ext)
    }

    /// Full path of the artifact for the reported extension
    pub fn artifact_path(&self, extension: Option<&str>) -> PathBuf {
        self.output_dir.join(self.file_name(extension))
    }

    /// Directory the artifact is written to
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

/// What the engine reports after a successful fetch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchOutcome {
    /// Container extension of the final file (without the dot)
    pub extension: Option<String>,
    /// Human-readable media title
    pub title: Option<String>,
}

impl FetchOutcome {
    /// Title to record, falling back to [`DEFAULT_TITLE`]
    pub fn title_or_default(&self) -> String {
        self.title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_TITLE)
            .to_string()
    }
}

/// Progress notification from a running fetch
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    /// Bytes are being transferred
    Downloading {
        /// Completion percentage (0.0-100.0)
        percent: f64,
    },
    /// Engine-specific intermediate phase (merging, post-processing, ...)
    Phase {
        /// Phase label, stored verbatim as the job status
        name: String,
        /// Completion percentage (0.0-100.0)
        percent: f64,
    },
    /// The transfer itself is done
    Finished,
}

impl ProgressEvent {
    /// `downloaded / total * 100` when the total is known and positive, else 0
    pub fn percent_of(downloaded: Option<u64>, total: Option<u64>) -> f64 {
        match (downloaded, total) {
            (Some(done), Some(total)) if total > 0 => {
                (done as f64 / total as f64 * 100.0).clamp(0.0, 100.0)
            }
            _ => 0.0,
        }
    }

    /// Convert a raw engine status plus byte counters into an event
    ///
    /// `"finished"` marks the end of the transfer, `"downloading"` is a
    /// transfer update and every other label becomes a [`ProgressEvent::Phase`].
    pub fn from_raw(status: &str, downloaded: Option<u64>, total: Option<u64>) -> Self {
        let percent = Self::percent_of(downloaded, total);
        match status.trim() {
            s if s.eq_ignore_ascii_case("finished") => ProgressEvent::Finished,
            s if s.eq_ignore_ascii_case("downloading") => ProgressEvent::Downloading { percent },
            other => ProgressEvent::Phase {
                name: other.to_string(),
                percent,
            },
        }
    }
}

/// A capability that retrieves the media behind a URL
///
/// Implementations push [`ProgressEvent`]s into `progress` (in order) and must
/// stop promptly with [`FetchError::Cancelled`] once `cancel` fires. Dropping
/// the sender when the fetch returns tells the consumer no more events follow.
#[async_trait]
pub trait FetchEngine: Send + Sync {
    /// Fetch `request.url` into `request.output_dir`
    ///
    /// # Errors
    ///
    /// Returns a [`FetchError`] describing why the media could not be retrieved.
    async fn fetch(
        &self,
        request: &FetchRequest,
        progress: ProgressSink,
        cancel: CancellationToken,
    ) -> Result<FetchOutcome, FetchError>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}
