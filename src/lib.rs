//! # media-dl
//!
//! Asynchronous media fetch job manager with a REST API.
//!
//! Clients submit a media page URL and get a job id back immediately. The
//! fetch runs in the background through a pluggable [`FetchEngine`] (the
//! default drives the `yt-dlp` command line tool), progress is persisted to
//! SQLite as it arrives, and the finished file is kept in a storage directory
//! until it is deleted.
//!
//! ## Quick Start
//!
//! ```no_run
//! use media_dl::{Config, MediaDownloader};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let downloader = MediaDownloader::new(Config::default()).await?;
//!
//!     let mut events = downloader.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let id = downloader.submit("https://example.com/watch?v=abc").await?;
//!     println!("submitted {id}");
//!
//!     media_dl::run_with_shutdown(downloader).await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API module
pub mod api;
/// Configuration types
pub mod config;
/// Database persistence layer
pub mod db;
/// Core job manager (decomposed into focused submodules)
pub mod downloader;
/// Error types
pub mod error;
/// Fetch engines and their progress protocol
pub mod fetch;
/// Retry logic with exponential backoff
pub mod retry;
/// Core types and events
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use db::{Database, Job};
pub use downloader::{BatchItem, MediaDownloader};
pub use error::{
    ApiError, DatabaseError, Error, ErrorDetail, FetchError, JobError, Result, ToHttpStatus,
};
pub use fetch::{
    CliFetchEngine, FetchEngine, FetchOutcome, FetchRequest, NoOpFetchEngine, ProgressEvent,
    ProgressSink,
};
pub use types::{ArtifactInfo, ClearSummary, Event, JobId, JobStatus};

use std::sync::Arc;

/// Helper function to run the downloader with graceful signal handling.
///
/// Waits for a termination signal and then calls the downloader's `shutdown()` method.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
pub async fn run_with_shutdown(downloader: MediaDownloader) -> Result<()> {
    wait_for_signal().await;
    downloader.shutdown().await
}

/// Serve the REST API until a termination signal arrives, then shut down.
///
/// The listener stops accepting connections first; running fetches are then
/// cancelled and left resumable for the next start.
///
/// # Example
///
/// ```no_run
/// use media_dl::{Config, MediaDownloader, serve_with_shutdown};
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let downloader = Arc::new(MediaDownloader::new(Config::default()).await?);
///     serve_with_shutdown(downloader).await?;
///     Ok(())
/// }
/// ```
pub async fn serve_with_shutdown(downloader: Arc<MediaDownloader>) -> Result<()> {
    // The server returns once the signal fires and in-flight requests finish
    let config = downloader.get_config();
    api::start_api_server_with_shutdown(downloader.clone(), config, wait_for_signal()).await?;
    downloader.shutdown().await
}

/// Resolve once SIGTERM or SIGINT (Ctrl+C elsewhere) arrives
#[cfg(unix)]
pub async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Set up signal handlers; registration can fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            if let Ok(mut sigint) = signal(SignalKind::interrupt()) {
                sigint.recv().await;
                tracing::info!("Received SIGINT signal (Ctrl+C)");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
        (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
                tracing::info!("Received SIGTERM signal");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }
}

/// Resolve once Ctrl+C arrives
#[cfg(not(unix))]
pub async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
