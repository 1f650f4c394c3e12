//! Core job manager split into focused submodules.
//!
//! The `MediaDownloader` struct and its methods are organized by domain:
//! - [`dispatch`] - Job submission and task spawning
//! - [`executor`] - Running one fetch and writing its terminal state
//! - [`progress`] - Per-job progress reporter task
//! - [`artifacts`] - Serving, deleting and clearing finished files
//! - [`batch`] - Fetching many URLs and waiting for all of them
//! - [`control`] - Job queries and cancellation
//! - [`lifecycle`] - Startup restore and shutdown coordination

mod artifacts;
mod batch;
mod control;
mod dispatch;
mod executor;
mod lifecycle;
mod progress;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

use crate::config::Config;
use crate::db::Database;
use crate::error::{Error, Result};
use crate::fetch::{self, FetchEngine};
use crate::types::{Event, JobId};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use tokio::sync::{Mutex, RwLock, Semaphore, broadcast};
use tokio_util::sync::CancellationToken;

pub use batch::BatchItem;

/// Buffer size of the event broadcast channel
const EVENT_CHANNEL_CAPACITY: usize = 1000;

/// Running-job bookkeeping shared by every clone of the downloader
#[derive(Clone)]
pub(crate) struct JobState {
    /// Bounds concurrent fetches (`None` when unbounded)
    pub(crate) concurrent_limit: Option<Arc<Semaphore>>,
    /// Cancellation tokens of jobs that have a live task
    pub(crate) active_jobs: Arc<Mutex<HashMap<JobId, CancellationToken>>>,
    /// Cleared during shutdown; submissions are rejected afterwards
    pub(crate) accepting_new: Arc<AtomicBool>,
    /// Held shared by `submit`, exclusively by `clear_all`
    pub(crate) clear_gate: Arc<RwLock<()>>,
}

impl JobState {
    fn new(max_concurrent_fetches: Option<usize>) -> Self {
        Self {
            concurrent_limit: max_concurrent_fetches.map(|n| Arc::new(Semaphore::new(n))),
            active_jobs: Arc::new(Mutex::new(HashMap::new())),
            accepting_new: Arc::new(AtomicBool::new(true)),
            clear_gate: Arc::new(RwLock::new(())),
        }
    }
}

/// Main job manager instance (cloneable - all fields are Arc-wrapped)
#[derive(Clone)]
pub struct MediaDownloader {
    /// Job record store
    /// Public for integration tests to query job records directly
    pub db: Arc<Database>,
    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: broadcast::Sender<Event>,
    /// Configuration (wrapped in Arc for sharing across tasks)
    pub(crate) config: Arc<Config>,
    /// Engine that performs the actual fetches
    pub(crate) engine: Arc<dyn FetchEngine>,
    /// Running-job bookkeeping
    pub(crate) job_state: JobState,
}

impl MediaDownloader {
    /// Create a new MediaDownloader using the engine described by `config.fetch`
    ///
    /// This:
    /// - Validates the configuration
    /// - Creates the download directory
    /// - Opens/creates the SQLite database and runs migrations
    /// - Re-dispatches jobs a previous process left unfinished (if enabled)
    pub async fn new(config: Config) -> Result<Self> {
        let engine = fetch::engine_from_config(&config.fetch);
        Self::new_with_engine(config, engine).await
    }

    /// Create a new MediaDownloader with an explicit fetch engine
    pub async fn new_with_engine(config: Config, engine: Arc<dyn FetchEngine>) -> Result<Self> {
        config.validate()?;

        tokio::fs::create_dir_all(&config.download.download_dir)
            .await
            .map_err(|e| {
                Error::Io(std::io::Error::new(
                    e.kind(),
                    format!(
                        "Failed to create download directory '{}': {}",
                        config.download.download_dir.display(),
                        e
                    ),
                ))
            })?;

        let db = Database::new(&config.persistence.database_path).await?;

        let (event_tx, _rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        tracing::info!(
            engine = engine.name(),
            max_concurrent_fetches = ?config.download.max_concurrent_fetches,
            strict_failures = config.download.strict_failures,
            "Media downloader initialized"
        );

        let downloader = Self {
            db: Arc::new(db),
            event_tx,
            job_state: JobState::new(config.download.max_concurrent_fetches),
            config: Arc::new(config),
            engine,
        };

        if downloader.config.download.resume_on_startup {
            downloader.restore_jobs().await?;
        }

        Ok(downloader)
    }

    /// Subscribe to job events
    ///
    /// Each subscriber receives all events independently. A subscriber that
    /// falls more than 1000 events behind gets `RecvError::Lagged`.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use media_dl::{MediaDownloader, Config};
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), Box<dyn std::error::Error>> {
    ///     let downloader = MediaDownloader::new(Config::default()).await?;
    ///
    ///     let mut events = downloader.subscribe();
    ///     tokio::spawn(async move {
    ///         while let Ok(event) = events.recv().await {
    ///             tracing::info!(?event, "job event");
    ///         }
    ///     });
    ///
    ///     downloader.submit("https://example.com/watch?v=abc").await?;
    ///     Ok(())
    /// }
    /// ```
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Get the current configuration
    pub fn get_config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    /// Name of the fetch engine in use
    pub fn engine_name(&self) -> &'static str {
        self.engine.name()
    }

    /// Emit an event to all subscribers
    ///
    /// Events are dropped silently when nobody is subscribed.
    pub(crate) fn emit_event(&self, event: Event) {
        self.event_tx.send(event).ok();
    }

    /// Spawn the REST API server in a background task
    ///
    /// Listens on `config.server.api.bind_address` (default: 127.0.0.1:8000).
    pub fn spawn_api_server(self: &Arc<Self>) -> tokio::task::JoinHandle<Result<()>> {
        let downloader = self.clone();
        let config = self.config.clone();

        tokio::spawn(async move { crate::api::start_api_server(downloader, config).await })
    }
}
