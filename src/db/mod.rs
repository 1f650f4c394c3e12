//! Database layer for media-dl
//!
//! Handles SQLite persistence for job records.
//!
//! ## Submodules
//!
//! Methods on [`Database`] are organized by domain:
//! - [`migrations`] - Database lifecycle, schema migrations
//! - [`jobs`] - Job record CRUD and progress writes

use crate::types::{JobId, JobStatus};
use sqlx::{FromRow, sqlite::SqlitePool};

mod jobs;
mod migrations;

/// New job to be inserted into the database
#[derive(Debug, Clone)]
pub struct NewJob {
    /// Identifier allocated by the dispatcher
    pub id: JobId,
    /// Source URL
    pub url: String,
}

/// Job record from database
#[derive(Debug, Clone, FromRow)]
pub struct Job {
    /// Unique job ID
    pub id: JobId,
    /// Source URL (immutable after creation)
    pub url: String,
    /// Artifact file name, empty until the fetch succeeds
    pub file_name: String,
    /// Status label (see [`JobStatus`])
    pub status: String,
    /// Progress percentage (0.0-100.0)
    pub percent: f64,
    /// Media title, empty until the fetch succeeds
    pub title: String,
    /// Fetch failure recorded by the executor
    pub error: Option<String>,
    /// Unix timestamp when the job was created
    pub created_at: i64,
    /// Unix timestamp of the last write
    pub updated_at: i64,
    /// Unix timestamp when the job reached a terminal status
    pub completed_at: Option<i64>,
}

impl Job {
    /// Parsed status
    pub fn status(&self) -> JobStatus {
        JobStatus::parse(&self.status)
    }
}

/// Partial update of a job record
///
/// Only the fields that are `Some` are written, so two writers touching
/// different fields of the same job never clobber each other.
#[derive(Debug, Clone, Default)]
pub struct JobUpdate {
    /// New artifact file name
    pub file_name: Option<String>,
    /// New title
    pub title: Option<String>,
    /// New status
    pub status: Option<JobStatus>,
    /// New progress percentage
    pub percent: Option<f64>,
    /// New error flag (`Some(None)` clears it)
    pub error: Option<Option<String>>,
}

impl JobUpdate {
    fn is_empty(&self) -> bool {
        self.file_name.is_none()
            && self.title.is_none()
            && self.status.is_none()
            && self.percent.is_none()
            && self.error.is_none()
    }
}

/// Database handle for media-dl
pub struct Database {
    pool: SqlitePool,
}
