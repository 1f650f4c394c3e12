//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`jobs`] - Submission, progress polling and cancellation
//! - [`files`] - Completed artifacts
//! - [`system`] - Health, events, OpenAPI

use crate::types::JobId;
use serde::{Deserialize, Serialize};

mod files;
mod jobs;
mod system;

pub use files::*;
pub use jobs::*;
pub use system::*;

// ============================================================================
// Request/Response Types (shared across handlers)
// ============================================================================

/// Request body for POST /download
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct DownloadRequest {
    /// Media page URL to fetch
    pub url: String,
}

/// Response body for POST /download
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DownloadStarted {
    /// Always "Download started"
    pub message: String,
    /// Identifier to poll with GET /progress/{id}
    pub download_id: String,
}

/// Response body for GET /progress/{id} when the job exists
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct JobProgress {
    /// Source URL
    pub url: String,
    /// Status label ("Downloading", an engine phase, "Completed", ...)
    pub status: String,
    /// Progress percentage (0.0 to 100.0)
    pub percent: f64,
    /// Media title, empty until the fetch succeeds
    pub title: String,
    /// Fetch failure, present even when the status reads "Completed"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// One entry of GET /list-files
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    /// Base64 of the job id (display only)
    pub file_name_encoded: String,
    /// Artifact file name (`<id>.<ext>`)
    pub original_file_name: String,
    /// Job id
    pub id: String,
    /// Media title
    pub title: String,
    /// Source URL
    pub url: String,
}

/// Response body for GET /list-files when at least one job completed
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct FileList {
    /// Completed jobs
    pub files: Vec<FileEntry>,
}

/// Plain `{message}` response
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct MessageResponse {
    /// Human-readable outcome
    pub message: String,
}

impl MessageResponse {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Parse a job id taken from the URL path
///
/// Anything that is not a UUID cannot name a job, so callers treat `None`
/// exactly like an unknown id.
pub(crate) fn parse_job_id(raw: &str) -> Option<JobId> {
    raw.parse().ok()
}
