//! No-op fetch engine for graceful degradation

use super::traits::{FetchEngine, FetchOutcome, FetchRequest, ProgressSink};
use crate::error::FetchError;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Engine used when no yt-dlp binary is available
///
/// The server still starts and serves existing artifacts; new jobs end with
/// an `EngineUnavailable` error recorded on the job.
///
/// # Examples
///
/// ```
/// use media_dl::fetch::{FetchEngine, FetchRequest, NoOpFetchEngine};
/// use media_dl::types::JobId;
/// use tokio_util::sync::CancellationToken;
///
/// # #[tokio::main]
/// # async fn main() {
/// let (tx, _rx) = tokio::sync::mpsc::channel(1);
/// let request = FetchRequest::new(JobId::new(), "https://example.com/v", "downloads");
/// let result = NoOpFetchEngine.fetch(&request, tx, CancellationToken::new()).await;
/// assert!(result.is_err());
/// # }
/// ```
pub struct NoOpFetchEngine;

#[async_trait]
impl FetchEngine for NoOpFetchEngine {
    async fn fetch(
        &self,
        _request: &FetchRequest,
        _progress: ProgressSink,
        _cancel: CancellationToken,
    ) -> Result<FetchOutcome, FetchError> {
        Err(FetchError::EngineUnavailable(
            "fetching media requires an external yt-dlp binary. \
             Configure fetch.binary_path or ensure yt-dlp is in PATH."
                .into(),
        ))
    }

    fn name(&self) -> &'static str {
        "noop"
    }
}
