//! media-dl binary
//!
//! Loads an optional JSON config file and applies command line overrides.
//! `serve` (the default) runs the REST API until SIGINT/SIGTERM; `fetch`
//! downloads a list of URLs in parallel and reports each failure.

use clap::{Parser, Subcommand};
use media_dl::{Config, MediaDownloader};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Asynchronous media fetch job manager with a REST API
#[derive(Debug, Parser)]
#[command(name = "media-dl", version, about)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// JSON config file (missing fields use defaults)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Address for the REST API
    #[arg(short, long, global = true)]
    bind: Option<SocketAddr>,

    /// Directory holding finished artifacts
    #[arg(long, global = true)]
    download_dir: Option<PathBuf>,

    /// SQLite database file
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    /// Maximum number of fetches running at once (unbounded if omitted)
    #[arg(long, global = true)]
    max_concurrent: Option<usize>,

    /// Record failed fetches as Failed instead of Completed
    #[arg(long, global = true)]
    strict_failures: bool,

    /// Path to the yt-dlp executable
    #[arg(long, global = true)]
    engine: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the REST API (default)
    Serve,
    /// Download the given URLs in parallel, then exit
    Fetch {
        /// Media page URLs
        #[arg(required = true)]
        urls: Vec<String>,
    },
}

/// Parallel fetches in batch mode when no bound is configured
const BATCH_WORKERS: usize = 4;

impl Args {
    fn into_config(self) -> Result<Config, Box<dyn std::error::Error>> {
        let mut config = match &self.config {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .map_err(|e| format!("cannot read config file {}: {}", path.display(), e))?;
                serde_json::from_str::<Config>(&raw)
                    .map_err(|e| format!("invalid config file {}: {}", path.display(), e))?
            }
            None => Config::default(),
        };

        if let Some(bind) = self.bind {
            config.server.api.bind_address = bind;
        }
        if let Some(dir) = self.download_dir {
            config.download.download_dir = dir;
        }
        if let Some(database) = self.database {
            config.persistence.database_path = database;
        }
        if let Some(max) = self.max_concurrent {
            config.download.max_concurrent_fetches = Some(max);
        }
        if self.strict_failures {
            config.download.strict_failures = true;
        }
        if let Some(engine) = self.engine {
            config.fetch.binary_path = Some(engine);
        }

        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,tower_http=info".into()),
        )
        .init();

    let mut args = Args::parse();
    let command = args.command.take().unwrap_or(Command::Serve);
    let mut config = args.into_config()?;

    match command {
        Command::Serve => {
            let downloader = Arc::new(MediaDownloader::new(config).await?);
            tracing::info!(
                engine = downloader.engine_name(),
                download_dir = %downloader.get_config().download_dir().display(),
                "media-dl ready"
            );

            media_dl::serve_with_shutdown(downloader).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Fetch { urls } => {
            if config.download.max_concurrent_fetches.is_none() {
                config.download.max_concurrent_fetches = Some(BATCH_WORKERS);
            }
            // Jobs left over from a server run are not part of this batch
            config.download.resume_on_startup = false;

            run_batch(config, urls).await
        }
    }
}

async fn run_batch(
    config: Config,
    urls: Vec<String>,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let downloader = MediaDownloader::new(config).await?;
    let download_dir = downloader.get_config().download_dir().clone();

    println!("Fetching {} URL(s) into {}", urls.len(), download_dir.display());

    let items = tokio::select! {
        items = downloader.fetch_batch(&urls) => items,
        _ = media_dl::wait_for_signal() => {
            downloader.shutdown().await?;
            return Ok(ExitCode::from(130));
        }
    };

    let mut failed = 0;
    for item in &items {
        match (item.failure(), &item.outcome) {
            (Some(reason), _) => {
                failed += 1;
                eprintln!("Failed to fetch {}: {}", item.url, reason);
            }
            (None, Ok(job)) => {
                println!("{} -> {}", item.url, download_dir.join(&job.file_name).display());
            }
            (None, Err(_)) => {}
        }
    }

    downloader.shutdown().await?;

    if failed == 0 {
        println!("All {} file(s) saved in {}", items.len(), download_dir.display());
        Ok(ExitCode::SUCCESS)
    } else {
        println!("{} of {} URL(s) failed", failed, items.len());
        Ok(ExitCode::FAILURE)
    }
}
