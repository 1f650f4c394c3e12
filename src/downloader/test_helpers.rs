//! Shared test helpers: a scripted fetch engine and downloader constructors.

use crate::config::Config;
use crate::db::Job;
use crate::downloader::MediaDownloader;
use crate::error::FetchError;
use crate::fetch::{FetchEngine, FetchOutcome, FetchRequest, ProgressEvent, ProgressSink};
use crate::types::JobId;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tempfile::tempdir;
use tokio_util::sync::CancellationToken;

/// Bytes written as the artifact by [`ScriptedEngine`]
pub(crate) const ARTIFACT_BYTES: &[u8] = b"fake media payload";

/// One scripted action performed before the fetch returns
#[derive(Clone, Debug)]
pub(crate) enum Step {
    /// Push a progress event
    Emit(ProgressEvent),
    /// Sleep (cancellable)
    Sleep(Duration),
    /// Block until the job is cancelled
    WaitForCancel,
}

/// In-process engine that replays a script instead of downloading
pub(crate) struct ScriptedEngine {
    steps: Vec<Step>,
    /// Per-attempt results; the last one repeats
    results: std::sync::Mutex<VecDeque<Result<FetchOutcome, FetchError>>>,
    write_artifact: bool,
    attempts: AtomicU32,
}

impl ScriptedEngine {
    /// Succeeds with the given extension and title, writing the artifact
    pub(crate) fn succeeding(extension: &str, title: &str) -> Self {
        Self::with_results(vec![Ok(FetchOutcome {
            extension: Some(extension.to_string()),
            title: Some(title.to_string()),
        })])
    }

    /// Fails every attempt with `error`
    pub(crate) fn failing(error: FetchError) -> Self {
        Self::with_results(vec![Err(error)])
    }

    /// Returns the given results attempt by attempt
    pub(crate) fn with_results(results: Vec<Result<FetchOutcome, FetchError>>) -> Self {
        Self {
            steps: Vec::new(),
            results: std::sync::Mutex::new(results.into()),
            write_artifact: true,
            attempts: AtomicU32::new(0),
        }
    }

    /// Run these steps before returning
    pub(crate) fn steps(mut self, steps: Vec<Step>) -> Self {
        self.steps = steps;
        self
    }

    /// Report success without creating the artifact file
    pub(crate) fn without_artifact(mut self) -> Self {
        self.write_artifact = false;
        self
    }

    /// Number of fetch calls so far
    pub(crate) fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    fn next_result(&self) -> Result<FetchOutcome, FetchError> {
        let mut results = self.results.lock().unwrap();
        if results.len() > 1 {
            results.pop_front().unwrap()
        } else {
            results
                .front()
                .cloned()
                .unwrap_or(Ok(FetchOutcome::default()))
        }
    }
}

#[async_trait]
impl FetchEngine for ScriptedEngine {
    async fn fetch(
        &self,
        request: &FetchRequest,
        progress: ProgressSink,
        cancel: CancellationToken,
    ) -> Result<FetchOutcome, FetchError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        for step in &self.steps {
            match step {
                Step::Emit(event) => {
                    let _ = progress.send(event.clone()).await;
                }
                Step::Sleep(duration) => {
                    tokio::select! {
                        _ = tokio::time::sleep(*duration) => {}
                        _ = cancel.cancelled() => return Err(FetchError::Cancelled),
                    }
                }
                Step::WaitForCancel => {
                    cancel.cancelled().await;
                    return Err(FetchError::Cancelled);
                }
            }
        }

        let result = self.next_result();
        if let Ok(outcome) = &result
            && self.write_artifact
        {
            let path = request.artifact_path(outcome.extension.as_deref());
            tokio::fs::create_dir_all(request.output_dir()).await.unwrap();
            tokio::fs::write(&path, ARTIFACT_BYTES).await.unwrap();
        }
        result
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Test configuration rooted in `dir`
pub(crate) fn test_config(dir: &std::path::Path) -> Config {
    let mut config = Config::default();
    config.persistence.database_path = dir.join("test.db");
    config.download.download_dir = dir.join("downloads");
    config
}

/// Downloader backed by `engine`, a temp database and a temp download dir.
/// Returns the tempdir, which must be kept alive.
pub(crate) async fn create_test_downloader(
    engine: Arc<dyn FetchEngine>,
) -> (MediaDownloader, tempfile::TempDir) {
    create_test_downloader_with(engine, |_| {}).await
}

/// Like [`create_test_downloader`] with a config tweak applied first
pub(crate) async fn create_test_downloader_with(
    engine: Arc<dyn FetchEngine>,
    tweak: impl FnOnce(&mut Config),
) -> (MediaDownloader, tempfile::TempDir) {
    let temp_dir = tempdir().unwrap();
    let mut config = test_config(temp_dir.path());
    tweak(&mut config);

    let downloader = MediaDownloader::new_with_engine(config, engine)
        .await
        .unwrap();
    (downloader, temp_dir)
}

/// Poll until the executor has written the job's terminal state (5s limit)
pub(crate) async fn wait_for_terminal(downloader: &MediaDownloader, id: JobId) -> Job {
    wait_for(downloader, id, |job| {
        job.status().is_terminal() && job.completed_at.is_some()
    })
    .await
}

/// Poll until `predicate` holds for the job (5s limit)
pub(crate) async fn wait_for(
    downloader: &MediaDownloader,
    id: JobId,
    predicate: impl Fn(&Job) -> bool,
) -> Job {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        if let Some(job) = downloader.get_job(id).await.unwrap()
            && predicate(&job)
        {
            return job;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "job {} did not reach the expected state in time",
            id
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// Poll until the downloader has no live job task (5s limit)
pub(crate) async fn wait_until_idle(downloader: &MediaDownloader) {
    tokio::time::timeout(Duration::from_secs(5), downloader.wait_for_active_jobs())
        .await
        .expect("job tasks did not exit in time");
}
