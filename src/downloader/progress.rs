//! Per-job progress reporter.
//!
//! The engine pushes [`ProgressEvent`]s into a bounded channel; one reporter
//! task per job drains it in order and persists every transition. The
//! executor awaits the returned handle before its terminal write.

use crate::db::Database;
use crate::fetch::ProgressEvent;
use crate::types::{Event, JobId, JobStatus};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};

/// Buffer size of the engine → reporter channel
pub(crate) const PROGRESS_CHANNEL_BUFFER: usize = 64;

/// Spawn the reporter for one job; it ends when every sender is dropped
pub(crate) fn spawn_progress_reporter(
    id: JobId,
    db: Arc<Database>,
    event_tx: broadcast::Sender<Event>,
    mut rx: mpsc::Receiver<ProgressEvent>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut reported_percent = 0.0_f64;

        while let Some(event) = rx.recv().await {
            let Some((status, percent)) = transition_for(&event) else {
                tracing::debug!(job_id = %id, ?event, "Ignoring progress event with a reserved label");
                continue;
            };

            match db.apply_progress(id, &status, percent).await {
                Ok(true) => {
                    reported_percent = reported_percent.max(percent);
                    tracing::debug!(
                        job_id = %id,
                        status = %status,
                        percent = reported_percent,
                        "Job progress"
                    );
                    event_tx
                        .send(Event::Progress {
                            id,
                            status,
                            percent: reported_percent,
                        })
                        .ok();
                }
                Ok(false) => {
                    // Terminal or deleted; later events can't change that
                    tracing::trace!(job_id = %id, "Progress write skipped");
                }
                Err(e) => {
                    tracing::error!(job_id = %id, error = %e, "Failed to update progress");
                }
            }
        }
    })
}

/// Status and percent an event moves the job to
///
/// `Finished` completes the transfer at 100%. A phase named like a
/// terminal status is rejected so an engine label can't end the job.
pub(crate) fn transition_for(event: &ProgressEvent) -> Option<(JobStatus, f64)> {
    match event {
        ProgressEvent::Finished => Some((JobStatus::Completed, 100.0)),
        ProgressEvent::Downloading { percent } => Some((JobStatus::Downloading, *percent)),
        ProgressEvent::Phase { name, percent } => {
            let status = JobStatus::parse(name);
            if status.is_terminal() {
                None
            } else {
                Some((status, *percent))
            }
        }
    }
}
