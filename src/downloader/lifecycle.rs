//! Startup restore and shutdown coordination.

use crate::error::Result;
use crate::types::Event;
use std::sync::atomic::Ordering;
use std::time::Duration;

use super::MediaDownloader;

/// How long shutdown waits for cancelled jobs to wind down
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Poll interval while waiting for active jobs
const ACTIVE_POLL_INTERVAL: Duration = Duration::from_millis(50);

impl MediaDownloader {
    /// Gracefully shut down the downloader
    ///
    /// 1. Stops accepting new submissions
    /// 2. Cancels all active jobs (their records stay non-terminal)
    /// 3. Waits up to 30 seconds for the job tasks to exit
    /// 4. Emits [`Event::Shutdown`]
    ///
    /// Interrupted jobs are picked up again on the next start when
    /// `resume_on_startup` is enabled.
    pub async fn shutdown(&self) -> Result<()> {
        tracing::info!("Initiating graceful shutdown");

        self.job_state.accepting_new.store(false, Ordering::SeqCst);
        tracing::info!("Stopped accepting new jobs");

        self.cancel_all_active().await;

        match tokio::time::timeout(SHUTDOWN_TIMEOUT, self.wait_for_active_jobs()).await {
            Ok(()) => tracing::info!("All active jobs stopped"),
            Err(_) => {
                tracing::warn!("Timeout waiting for jobs to stop, proceeding with shutdown")
            }
        }

        self.emit_event(Event::Shutdown);
        tracing::info!("Graceful shutdown complete");
        Ok(())
    }

    /// Re-dispatch jobs a previous process left unfinished
    ///
    /// Returns the number of jobs restarted. Progress already recorded is
    /// kept; the stored percent never goes down.
    pub(crate) async fn restore_jobs(&self) -> Result<usize> {
        let jobs = self.db.list_incomplete_jobs().await?;
        let count = jobs.len();

        for job in jobs {
            tracing::info!(job_id = %job.id, status = %job.status, "Restoring unfinished job");
            self.spawn_job(job.id, job.url).await;
        }

        if count > 0 {
            tracing::info!(count, "Restored unfinished jobs");
        }
        Ok(count)
    }

    /// Signal cancellation to every job with a live task
    pub(crate) async fn cancel_all_active(&self) {
        let active = self.job_state.active_jobs.lock().await;
        tracing::debug!(active_count = active.len(), "Cancelling all active jobs");

        for (id, token) in active.iter() {
            tracing::debug!(job_id = %id, "Signaling cancellation");
            token.cancel();
        }
    }

    /// Wait until no job task is left
    pub(crate) async fn wait_for_active_jobs(&self) {
        loop {
            let active_count = self.active_job_count().await;
            if active_count == 0 {
                return;
            }

            tracing::debug!(active_count, "Waiting for active jobs to stop");
            tokio::time::sleep(ACTIVE_POLL_INTERVAL).await;
        }
    }
}
