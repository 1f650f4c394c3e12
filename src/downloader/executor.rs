//! Fetch executor: runs one job's fetch and writes its terminal state.

use crate::db::JobUpdate;
use crate::error::FetchError;
use crate::fetch::{FetchOutcome, FetchRequest};
use crate::retry::fetch_with_retry;
use crate::types::{Event, JobId, JobStatus};
use std::sync::atomic::Ordering;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::MediaDownloader;
use super::artifacts::remove_fragments;
use super::progress::{PROGRESS_CHANNEL_BUFFER, spawn_progress_reporter};

/// Everything a spawned job task needs
pub(crate) struct JobTaskContext {
    /// Job ID
    pub(crate) id: JobId,
    /// Source URL
    pub(crate) url: String,
    /// Fires on cancel, delete, clear or shutdown
    pub(crate) cancel_token: CancellationToken,
    /// Owning downloader (cheap clone)
    pub(crate) downloader: MediaDownloader,
}

/// Run one job to completion
///
/// 1. Waits for a concurrency slot (if bounded)
/// 2. Starts the progress reporter and runs the fetch with retries
/// 3. Waits for the reporter to drain, then writes the terminal state
pub(crate) async fn run_fetch_job(ctx: JobTaskContext) {
    let JobTaskContext {
        id,
        url,
        cancel_token,
        downloader,
    } = ctx;

    let request = FetchRequest::new(id, url, downloader.config.download.download_dir.clone());

    let _permit = match downloader.job_state.concurrent_limit.clone() {
        Some(limit) => tokio::select! {
            biased;
            _ = cancel_token.cancelled() => {
                downloader.finalize(&request, Err(FetchError::Cancelled)).await;
                return;
            }
            permit = limit.acquire_owned() => permit.ok(),
        },
        None => None,
    };

    tracing::info!(job_id = %id, url = %request.url, engine = downloader.engine.name(), "Starting fetch");

    let (progress_tx, progress_rx) = mpsc::channel(PROGRESS_CHANNEL_BUFFER);
    let reporter = spawn_progress_reporter(
        id,
        downloader.db.clone(),
        downloader.event_tx.clone(),
        progress_rx,
    );

    let engine = downloader.engine.clone();
    let retry = &downloader.config.fetch.retry;
    let result = tokio::select! {
        result = fetch_with_retry(retry, || {
            let engine = engine.clone();
            let progress = progress_tx.clone();
            let cancel = cancel_token.clone();
            let request = &request;
            async move { engine.fetch(request, progress, cancel).await }
        }) => result,
        _ = cancel_token.cancelled() => Err(FetchError::Cancelled),
    };

    // Closing the last sender ends the reporter once it has drained
    drop(progress_tx);
    if let Err(e) = reporter.await {
        tracing::error!(job_id = %id, error = %e, "Progress reporter task failed");
    }

    let result = match result {
        Err(_) if cancel_token.is_cancelled() => Err(FetchError::Cancelled),
        other => other,
    };
    downloader.finalize(&request, result).await;
}

impl MediaDownloader {
    /// Authoritative terminal write for a job
    ///
    /// Success records the artifact name and title and ends `Completed`.
    /// A fetch failure is recorded in `error` and ends `Completed`, or
    /// `Failed` when `strict_failures` is set. Cancellation ends `Cancelled`,
    /// except during shutdown, where the record is left as-is so the job is
    /// restored on the next start.
    pub(crate) async fn finalize(
        &self,
        request: &FetchRequest,
        result: Result<FetchOutcome, FetchError>,
    ) {
        let id = request.job_id;
        let (update, event) = match result {
            Ok(outcome) => {
                let file_name = request.file_name(outcome.extension.as_deref());
                let path = request.artifact_path(outcome.extension.as_deref());
                let title = outcome.title_or_default();

                tracing::info!(job_id = %id, path = %path.display(), title = %title, "Fetch finished");
                match tokio::fs::try_exists(&path).await {
                    Ok(true) => {}
                    _ => tracing::error!(job_id = %id, path = %path.display(), "Artifact not found after fetch"),
                }

                (
                    JobUpdate {
                        file_name: Some(file_name.clone()),
                        title: Some(title.clone()),
                        status: Some(JobStatus::Completed),
                        percent: Some(100.0),
                        error: Some(None),
                    },
                    Event::Completed {
                        id,
                        file_name,
                        title,
                        error: None,
                    },
                )
            }
            Err(FetchError::Cancelled) => {
                if !self.job_state.accepting_new.load(Ordering::SeqCst) {
                    tracing::info!(job_id = %id, "Fetch interrupted by shutdown, job will resume on restart");
                    self.release(id).await;
                    return;
                }

                tracing::info!(job_id = %id, "Fetch cancelled");
                (
                    JobUpdate {
                        status: Some(JobStatus::Cancelled),
                        error: Some(Some(FetchError::Cancelled.to_string())),
                        ..Default::default()
                    },
                    Event::Cancelled { id },
                )
            }
            Err(e) => {
                tracing::error!(job_id = %id, error = %e, "Error fetching media");
                let message = e.to_string();

                if self.config.download.strict_failures {
                    (
                        JobUpdate {
                            status: Some(JobStatus::Failed),
                            error: Some(Some(message.clone())),
                            ..Default::default()
                        },
                        Event::Failed { id, error: message },
                    )
                } else {
                    (
                        JobUpdate {
                            status: Some(JobStatus::Completed),
                            error: Some(Some(message.clone())),
                            ..Default::default()
                        },
                        Event::Completed {
                            id,
                            file_name: String::new(),
                            title: String::new(),
                            error: Some(message),
                        },
                    )
                }
            }
        };

        match self.db.finalize_job(id, &update).await {
            Ok(true) => {
                tracing::info!(job_id = %id, status = ?update.status.as_ref().map(JobStatus::as_str), "Job finished");
                self.emit_event(event);
            }
            Ok(false) => {
                // Deleted or cleared mid-fetch; the engine may have written after the sweep
                tracing::debug!(job_id = %id, "Job record removed before it finished");
                remove_fragments(self.config.download_dir(), id).await;
            }
            Err(e) => {
                tracing::error!(job_id = %id, error = %e, "Failed to record job result");
            }
        }

        self.release(id).await;
    }

    /// Forget the job's cancellation token
    async fn release(&self, id: JobId) {
        let mut active = self.job_state.active_jobs.lock().await;
        active.remove(&id);
    }
}
