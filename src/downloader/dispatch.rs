//! Job submission and task spawning.

use crate::db::NewJob;
use crate::error::{Error, Result};
use crate::types::{Event, JobId};
use std::sync::atomic::Ordering;
use tokio_util::sync::CancellationToken;

use super::MediaDownloader;
use super::executor::{JobTaskContext, run_fetch_job};

impl MediaDownloader {
    /// Submit a URL for fetching
    ///
    /// Records the job (status `Downloading`, percent 0) and returns its id as
    /// soon as the record is durable. The fetch itself runs on a spawned task;
    /// this call never waits for it.
    ///
    /// Submitting the same URL twice creates two independent jobs.
    ///
    /// # Errors
    ///
    /// - [`Error::ShuttingDown`] once [`shutdown`](Self::shutdown) has started
    /// - [`Error::InvalidUrl`] for an empty or unparsable URL
    /// - a database error if the record cannot be written
    pub async fn submit(&self, url: &str) -> Result<JobId> {
        if !self.job_state.accepting_new.load(Ordering::SeqCst) {
            return Err(Error::ShuttingDown);
        }

        let url = validate_url(url)?;
        let id = JobId::new();

        // A clear in progress must not sweep a record whose task it never cancelled
        let _gate = self.job_state.clear_gate.read().await;

        self.db
            .insert_job(&NewJob {
                id,
                url: url.clone(),
            })
            .await?;

        tracing::info!(job_id = %id, url = %url, "Created new job");
        self.emit_event(Event::Queued {
            id,
            url: url.clone(),
        });

        self.spawn_job(id, url).await;
        Ok(id)
    }

    /// Register a cancellation token for the job and start its task
    ///
    /// The token is registered before the task waits for a concurrency slot,
    /// so a queued job can be cancelled too.
    pub(crate) async fn spawn_job(&self, id: JobId, url: String) {
        let cancel_token = CancellationToken::new();
        {
            let mut active = self.job_state.active_jobs.lock().await;
            active.insert(id, cancel_token.clone());
        }

        let ctx = JobTaskContext {
            id,
            url,
            cancel_token,
            downloader: self.clone(),
        };
        tokio::spawn(run_fetch_job(ctx));
    }
}

/// Trim and parse a submitted URL; it must be absolute and have a host
pub(crate) fn validate_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidUrl("URL is empty".to_string()));
    }

    let parsed = url::Url::parse(trimmed)
        .map_err(|e| Error::InvalidUrl(format!("{}: {}", trimmed, e)))?;
    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(Error::InvalidUrl(format!("{}: URL has no host", trimmed)));
    }

    Ok(trimmed.to_string())
}
