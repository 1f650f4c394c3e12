//! In-process fetch engine for driving jobs without yt-dlp

use async_trait::async_trait;
use media_dl::{FetchEngine, FetchError, FetchOutcome, FetchRequest, ProgressEvent, ProgressSink};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Bytes written as the artifact of every successful fetch
pub const MEDIA_BYTES: &[u8] = b"\x00\x00\x00\x18ftypmp42 integration";

/// Engine that replays a fixed progress script and then succeeds or fails
pub struct FakeEngine {
    progress: Vec<ProgressEvent>,
    outcome: Result<FetchOutcome, FetchError>,
    step_delay: Duration,
    hold_until_cancelled: bool,
    calls: AtomicU32,
}

impl FakeEngine {
    /// Engine that reports a typical transfer and produces `<id>.<extension>`
    pub fn succeeding(extension: &str, title: &str) -> Self {
        Self {
            progress: vec![
                ProgressEvent::Downloading { percent: 10.0 },
                ProgressEvent::Downloading { percent: 55.0 },
                ProgressEvent::Downloading { percent: 100.0 },
                ProgressEvent::Phase {
                    name: "Merger".into(),
                    percent: 100.0,
                },
                ProgressEvent::Finished,
            ],
            outcome: Ok(FetchOutcome {
                extension: Some(extension.to_string()),
                title: Some(title.to_string()),
            }),
            step_delay: Duration::from_millis(5),
            hold_until_cancelled: false,
            calls: AtomicU32::new(0),
        }
    }

    /// Engine whose every fetch fails with `error`
    pub fn failing(error: FetchError) -> Self {
        Self {
            progress: vec![ProgressEvent::Downloading { percent: 5.0 }],
            outcome: Err(error),
            ..Self::succeeding("mp4", "")
        }
    }

    /// Report some progress, then block until the job is cancelled
    pub fn hanging() -> Self {
        Self {
            progress: vec![ProgressEvent::Downloading { percent: 20.0 }],
            hold_until_cancelled: true,
            ..Self::succeeding("mp4", "")
        }
    }

    /// Pause between progress events
    pub fn with_step_delay(mut self, delay: Duration) -> Self {
        self.step_delay = delay;
        self
    }

    /// Number of fetches started so far
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FetchEngine for FakeEngine {
    async fn fetch(
        &self,
        request: &FetchRequest,
        progress: ProgressSink,
        cancel: CancellationToken,
    ) -> Result<FetchOutcome, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        for event in &self.progress {
            tokio::select! {
                _ = cancel.cancelled() => return Err(FetchError::Cancelled),
                _ = tokio::time::sleep(self.step_delay) => {}
            }
            progress
                .send(event.clone())
                .await
                .map_err(|e| FetchError::Engine(e.to_string()))?;
        }

        if self.hold_until_cancelled {
            cancel.cancelled().await;
            return Err(FetchError::Cancelled);
        }

        let outcome = self.outcome.clone()?;
        tokio::fs::write(
            request.artifact_path(outcome.extension.as_deref()),
            MEDIA_BYTES,
        )
        .await
        .map_err(|e| FetchError::Disk(e.to_string()))?;
        Ok(outcome)
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}
