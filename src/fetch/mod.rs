//! Media fetch engines
//!
//! The job manager never talks to a downloader directly. It hands a
//! [`FetchRequest`] to a [`FetchEngine`], receives [`ProgressEvent`]s on a
//! channel while the transfer runs, and gets back a [`FetchOutcome`] or a
//! [`FetchError`](crate::error::FetchError).
//!
//! ## Architecture
//!
//! - [`CliFetchEngine`]: drives an external `yt-dlp` binary
//! - [`NoOpFetchEngine`]: stub used when no engine is installed; every fetch fails
//!   with `EngineUnavailable`
//!
//! ## Usage
//!
//! ```no_run
//! use media_dl::fetch::{CliFetchEngine, FetchEngine, FetchRequest};
//! use media_dl::types::JobId;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let engine = CliFetchEngine::from_path().expect("yt-dlp not found");
//!     let request = FetchRequest::new(JobId::new(), "https://example.com/v", "downloads");
//!     let (tx, mut rx) = tokio::sync::mpsc::channel(64);
//!
//!     tokio::spawn(async move {
//!         while let Some(event) = rx.recv().await {
//!             println!("{:?}", event);
//!         }
//!     });
//!
//!     let outcome = engine.fetch(&request, tx, CancellationToken::new()).await?;
//!     println!("saved as {}", request.file_name(outcome.extension.as_deref()));
//!     Ok(())
//! }
//! ```

mod cli;
mod noop;
mod parser;
mod traits;

pub use cli::CliFetchEngine;
pub use noop::NoOpFetchEngine;
pub use traits::{
    DEFAULT_EXTENSION, DEFAULT_TITLE, FetchEngine, FetchOutcome, FetchRequest, ProgressEvent,
    ProgressSink,
};

use crate::config::FetchConfig;
use std::sync::Arc;

/// Pick the engine described by the fetch configuration
///
/// Uses the explicit binary path when set, otherwise searches `PATH` (if
/// allowed), and falls back to [`NoOpFetchEngine`] when nothing is found.
pub fn engine_from_config(config: &FetchConfig) -> Arc<dyn FetchEngine> {
    match CliFetchEngine::from_config(config) {
        Some(engine) => {
            tracing::info!(binary = %engine.binary_path().display(), "Using yt-dlp fetch engine");
            Arc::new(engine)
        }
        None => {
            tracing::warn!(
                "No yt-dlp binary configured or found in PATH; every fetch will fail until one is installed"
            );
            Arc::new(NoOpFetchEngine)
        }
    }
}
