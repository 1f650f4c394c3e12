//! Artifact lifecycle: serving, deleting and clearing finished files.

use crate::error::{Error, JobError, Result};
use crate::types::{ArtifactInfo, ClearSummary, Event, JobId, JobStatus};
use std::path::{Path, PathBuf};

use super::MediaDownloader;

impl MediaDownloader {
    /// Locate the artifact of a job
    ///
    /// Returns the file path and the name to offer the client.
    ///
    /// # Errors
    ///
    /// - [`JobError::NotFound`] if no such job exists
    /// - [`JobError::ArtifactMissing`] if the job has no file name yet or the
    ///   file is gone from disk
    pub async fn artifact(&self, id: JobId) -> Result<(PathBuf, String)> {
        let job = self.db.get_job(id).await?.ok_or_else(|| not_found(id))?;

        let path = self.config.download_dir().join(&job.file_name);
        if job.file_name.is_empty() || !is_file(&path).await {
            tracing::warn!(job_id = %id, path = %path.display(), "Artifact not found");
            return Err(Error::Job(JobError::ArtifactMissing {
                id: id.to_string(),
                path,
            }));
        }

        Ok((path, job.file_name))
    }

    /// Delete a job and its artifact
    ///
    /// Cancels the fetch if it is still running, removes the record, then the
    /// artifact (a missing file is fine) and any partial fragments.
    ///
    /// # Errors
    ///
    /// Returns [`JobError::NotFound`] if no such job exists.
    pub async fn delete(&self, id: JobId) -> Result<()> {
        let job = self.db.get_job(id).await?.ok_or_else(|| not_found(id))?;

        {
            let active = self.job_state.active_jobs.lock().await;
            if let Some(token) = active.get(&id) {
                tracing::info!(job_id = %id, "Cancelling running fetch before delete");
                token.cancel();
            }
        }

        // Record first: a fetch finishing after this point cleans up its own files
        self.db.delete_job(id).await?;

        let dir = self.config.download_dir();
        if !job.file_name.is_empty() {
            remove_file_if_present(&dir.join(&job.file_name)).await?;
        }
        remove_fragments(dir, id).await;

        tracing::info!(job_id = %id, "Job deleted");
        self.emit_event(Event::Removed { id });

        Ok(())
    }

    /// Remove every file in the storage directory and every job record
    ///
    /// Running fetches are cancelled first. Files that cannot be removed are
    /// logged and skipped. Submissions wait until the clear has finished.
    pub async fn clear_all(&self) -> Result<ClearSummary> {
        let _gate = self.job_state.clear_gate.write().await;
        self.cancel_all_active().await;
        let jobs_removed = self.db.delete_all_jobs().await?;

        let dir = self.config.download_dir();
        let mut files_removed = 0u64;

        match tokio::fs::read_dir(dir).await {
            Ok(mut entries) => {
                while let Some(entry) = entries.next_entry().await? {
                    let path = entry.path();
                    if !is_file(&path).await {
                        continue;
                    }
                    match tokio::fs::remove_file(&path).await {
                        Ok(()) => files_removed += 1,
                        Err(e) => {
                            tracing::warn!(path = %path.display(), error = %e, "Failed to remove file during clear");
                        }
                    }
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(Error::Io(e)),
        }

        let summary = ClearSummary {
            jobs_removed,
            files_removed,
        };
        tracing::info!(jobs_removed, files_removed, "Cleared all downloads");
        self.emit_event(Event::Cleared {
            jobs_removed,
            files_removed,
        });

        Ok(summary)
    }

    /// Every `Completed` job, oldest first
    ///
    /// A job whose fetch failed still ends `Completed` unless strict failure
    /// reporting is on, so entries may carry an empty file name.
    pub async fn list_completed(&self) -> Result<Vec<ArtifactInfo>> {
        let jobs = self.db.list_jobs_by_status(&JobStatus::Completed).await?;

        Ok(jobs
            .into_iter()
            .map(|job| ArtifactInfo {
                encoded_id: job.id.encoded(),
                id: job.id,
                file_name: job.file_name,
                title: job.title,
                url: job.url,
            })
            .collect())
    }
}

fn not_found(id: JobId) -> Error {
    Error::Job(JobError::NotFound { id: id.to_string() })
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false)
}

async fn remove_file_if_present(path: &Path) -> Result<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "Removed artifact");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::Io(e)),
    }
}

/// Best-effort removal of `<id>.*` leftovers (`.part`, per-stream files)
pub(super) async fn remove_fragments(dir: &Path, id: JobId) {
    let prefix = format!("{}.", id);
    let Ok(mut entries) = tokio::fs::read_dir(dir).await else {
        return;
    };

    while let Ok(Some(entry)) = entries.next_entry().await {
        if !entry.file_name().to_string_lossy().starts_with(&prefix) {
            continue;
        }
        let path = entry.path();
        if let Err(e) = tokio::fs::remove_file(&path).await {
            tracing::warn!(job_id = %id, path = %path.display(), error = %e, "Failed to remove partial file");
        }
    }
}
