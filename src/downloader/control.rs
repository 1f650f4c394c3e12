//! Job queries and cancellation.

use crate::db::{Job, JobUpdate};
use crate::error::{Error, JobError, Result};
use crate::types::{Event, JobId, JobStatus};

use super::MediaDownloader;

impl MediaDownloader {
    /// Get a job record by id
    pub async fn get_job(&self, id: JobId) -> Result<Option<Job>> {
        self.db.get_job(id).await
    }

    /// All job records, oldest first
    pub async fn list_jobs(&self) -> Result<Vec<Job>> {
        self.db.list_jobs().await
    }

    /// Number of jobs that currently have a live task
    pub async fn active_job_count(&self) -> usize {
        self.job_state.active_jobs.lock().await.len()
    }

    /// Cancel a job that has not finished yet
    ///
    /// A running fetch is stopped and the job ends `Cancelled`; the record
    /// and any finished artifact are kept. A job that has no live task in
    /// this process (left over from an earlier run) is marked `Cancelled`
    /// directly.
    ///
    /// # Errors
    ///
    /// - [`JobError::NotFound`] if no such job exists
    /// - [`JobError::InvalidState`] if the job is already terminal
    pub async fn cancel(&self, id: JobId) -> Result<()> {
        let job = self
            .db
            .get_job(id)
            .await?
            .ok_or_else(|| Error::Job(JobError::NotFound { id: id.to_string() }))?;

        let status = job.status();
        if status.is_terminal() {
            return Err(Error::Job(JobError::InvalidState {
                id: id.to_string(),
                operation: "cancel".to_string(),
                current_state: status.to_string(),
            }));
        }

        let token = {
            let active = self.job_state.active_jobs.lock().await;
            active.get(&id).cloned()
        };

        match token {
            Some(token) => {
                tracing::info!(job_id = %id, "Cancelling job");
                token.cancel();
            }
            None => {
                tracing::info!(job_id = %id, "Cancelling job with no live task");
                self.db
                    .finalize_job(
                        id,
                        &JobUpdate {
                            status: Some(JobStatus::Cancelled),
                            ..Default::default()
                        },
                    )
                    .await?;
                self.emit_event(Event::Cancelled { id });
            }
        }

        Ok(())
    }
}
