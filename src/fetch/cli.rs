//! CLI-based fetch engine using an external yt-dlp binary

use super::parser::{
    classify_failure, download_progress_template, parse_progress_line, parse_result_line,
    postprocess_progress_template, result_print_template,
};
use super::traits::{FetchEngine, FetchOutcome, FetchRequest, ProgressEvent, ProgressSink};
use crate::config::FetchConfig;
use crate::error::FetchError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

const DEFAULT_FORMAT: &str = "bestvideo+bestaudio/best";

/// Fetch engine that shells out to `yt-dlp`
///
/// Downloads a single item (playlists are never expanded) into
/// `<dir>/<job id>.<ext>`, streaming progress from yt-dlp's progress
/// templates. yt-dlp finishes each selected stream separately, so
/// [`ProgressEvent::Finished`] is sent once, after the process exits
/// successfully. Cancelling the token kills the child process.
///
/// # Examples
///
/// ```no_run
/// use media_dl::fetch::CliFetchEngine;
/// use std::path::PathBuf;
///
/// // Explicit binary
/// let engine = CliFetchEngine::new(PathBuf::from("/usr/local/bin/yt-dlp"));
///
/// // Or auto-discover from PATH
/// let engine = CliFetchEngine::from_path().expect("yt-dlp not found in PATH");
/// ```
pub struct CliFetchEngine {
    binary_path: PathBuf,
    format: String,
    extra_args: Vec<String>,
}

impl CliFetchEngine {
    /// Create an engine with an explicit binary path and default options
    pub fn new(binary_path: PathBuf) -> Self {
        Self {
            binary_path,
            format: DEFAULT_FORMAT.to_string(),
            extra_args: Vec::new(),
        }
    }

    /// Attempt to find `yt-dlp` in PATH
    pub fn from_path() -> Option<Self> {
        which::which("yt-dlp").ok().map(Self::new)
    }

    /// Build from configuration
    ///
    /// An explicit `binary_path` wins; otherwise PATH is searched when
    /// `search_path` is enabled. Returns `None` when no binary is available.
    pub fn from_config(config: &FetchConfig) -> Option<Self> {
        let engine = match &config.binary_path {
            Some(path) => Some(Self::new(path.clone())),
            None if config.search_path => Self::from_path(),
            None => None,
        }?;
        Some(
            engine
                .with_format(config.format.clone())
                .with_extra_args(config.extra_args.clone()),
        )
    }

    /// Override the format selector
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    /// Append extra arguments passed verbatim before the URL
    pub fn with_extra_args(mut self, args: Vec<String>) -> Self {
        self.extra_args = args;
        self
    }

    /// Path of the binary this engine runs
    pub fn binary_path(&self) -> &Path {
        &self.binary_path
    }

    fn build_args(&self, request: &FetchRequest) -> Vec<String> {
        let mut args = vec![
            "--newline".to_string(),
            "--no-playlist".to_string(),
            "--no-colors".to_string(),
            "--progress".to_string(),
            "--quiet".to_string(),
            "--no-simulate".to_string(),
            "-f".to_string(),
            self.format.clone(),
            "-o".to_string(),
            request.output_template().to_string_lossy().into_owned(),
            "--progress-template".to_string(),
            download_progress_template(),
            "--progress-template".to_string(),
            postprocess_progress_template(),
            "--print".to_string(),
            result_print_template(),
        ];
        args.extend(self.extra_args.iter().cloned());
        // Stops option parsing so a URL starting with '-' is never read as a flag
        args.push("--".to_string());
        args.push(request.url.clone());
        args
    }
}

#[async_trait]
impl FetchEngine for CliFetchEngine {
    async fn fetch(
        &self,
        request: &FetchRequest,
        progress: ProgressSink,
        cancel: CancellationToken,
    ) -> Result<FetchOutcome, FetchError> {
        tokio::fs::create_dir_all(request.output_dir())
            .await
            .map_err(|e| FetchError::Disk(format!("cannot create output directory: {}", e)))?;

        let mut child = Command::new(&self.binary_path)
            .args(self.build_args(request))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    FetchError::EngineUnavailable(format!(
                        "{} not found",
                        self.binary_path.display()
                    ))
                } else {
                    FetchError::Engine(format!("failed to execute yt-dlp: {}", e))
                }
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| FetchError::Engine("yt-dlp stdout not captured".into()))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| FetchError::Engine("yt-dlp stderr not captured".into()))?;

        // Drain stderr concurrently so a chatty engine never blocks on a full pipe
        let stderr_task = tokio::spawn(async move {
            let mut buf = String::new();
            let _ = stderr.read_to_string(&mut buf).await;
            buf
        });

        let mut lines = BufReader::new(stdout).lines();
        let mut outcome = None;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!(job_id = %request.job_id, "Cancelling yt-dlp");
                    let _ = child.kill().await;
                    stderr_task.abort();
                    return Err(FetchError::Cancelled);
                }
                line = lines.next_line() => {
                    match line {
                        Ok(Some(line)) => {
                            if let Some(event) = parse_progress_line(&line) {
                                // One "finished" per stream; completion is reported once below
                                if event == ProgressEvent::Finished {
                                    continue;
                                }
                                // Receiver gone means nobody is recording progress anymore
                                let _ = progress.send(event).await;
                            } else if let Some(result) = parse_result_line(&line) {
                                outcome = Some(result);
                            } else {
                                tracing::trace!(job_id = %request.job_id, line = %line, "yt-dlp");
                            }
                        }
                        Ok(None) => break,
                        Err(e) => {
                            tracing::warn!(job_id = %request.job_id, error = %e, "Failed to read yt-dlp output");
                            break;
                        }
                    }
                }
            }
        }

        let status = tokio::select! {
            _ = cancel.cancelled() => {
                let _ = child.kill().await;
                stderr_task.abort();
                return Err(FetchError::Cancelled);
            }
            status = child.wait() => status
                .map_err(|e| FetchError::Engine(format!("failed to wait for yt-dlp: {}", e)))?,
        };
        let stderr = stderr_task.await.unwrap_or_default();

        if !status.success() {
            return Err(classify_failure(&stderr));
        }

        let _ = progress.send(ProgressEvent::Finished).await;
        Ok(outcome.unwrap_or_default())
    }

    fn name(&self) -> &'static str {
        "yt-dlp"
    }
}
