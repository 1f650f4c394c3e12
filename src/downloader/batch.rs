//! Batch fetching: many URLs in one call, each reported on its own.

use crate::db::Job;
use crate::error::{Error, JobError, Result};
use crate::types::{JobId, JobStatus};
use std::time::Duration;

use super::MediaDownloader;

/// Poll interval while waiting for batch jobs to settle
const BATCH_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// How one URL of a batch ended
#[derive(Debug)]
pub struct BatchItem {
    /// URL as submitted
    pub url: String,
    /// Final job record, or why the URL never got one
    pub outcome: Result<Job>,
}

impl BatchItem {
    /// Failure message for this URL, `None` if its artifact was produced
    pub fn failure(&self) -> Option<String> {
        match &self.outcome {
            Err(e) => Some(e.to_string()),
            Ok(job) => match (job.status(), &job.error) {
                (_, Some(error)) => Some(error.clone()),
                (JobStatus::Completed, None) => None,
                (status, None) => Some(format!("job ended {}", status.as_str())),
            },
        }
    }
}

impl MediaDownloader {
    /// Submit every URL, then wait for each job to reach a terminal status
    ///
    /// A URL that is rejected or whose fetch fails is reported in its own
    /// [`BatchItem`]; the rest of the batch carries on. Items come back in the
    /// order of `urls`. Parallelism follows `max_concurrent_fetches`.
    pub async fn fetch_batch<S: AsRef<str>>(&self, urls: &[S]) -> Vec<BatchItem> {
        let mut submitted = Vec::with_capacity(urls.len());
        for url in urls {
            let url = url.as_ref();
            let result = self.submit(url).await;
            if let Err(e) = &result {
                tracing::warn!(url = %url, error = %e, "Batch URL rejected");
            }
            submitted.push((url.to_string(), result));
        }

        let mut items = Vec::with_capacity(submitted.len());
        for (url, result) in submitted {
            let outcome = match result {
                Ok(id) => self.wait_for_terminal(id).await,
                Err(e) => Err(e),
            };
            items.push(BatchItem { url, outcome });
        }

        let failed = items.iter().filter(|item| item.failure().is_some()).count();
        tracing::info!(total = items.len(), failed, "Batch finished");
        items
    }

    /// Poll the store until the executor has written the job's terminal state
    async fn wait_for_terminal(&self, id: JobId) -> Result<Job> {
        loop {
            match self.db.get_job(id).await? {
                Some(job) if job.status().is_terminal() && job.completed_at.is_some() => {
                    return Ok(job);
                }
                Some(_) => {}
                None => return Err(Error::Job(JobError::NotFound { id: id.to_string() })),
            }
            tokio::time::sleep(BATCH_POLL_INTERVAL).await;
        }
    }
}
