//! Common test utilities for media-dl integration tests

#[allow(dead_code)]
pub mod assertions;
#[allow(dead_code)]
pub mod engine;

#[allow(unused_imports)]
pub use assertions::*;
#[allow(unused_imports)]
pub use engine::*;

use media_dl::{Config, FetchEngine, MediaDownloader};
use std::sync::Arc;
use tempfile::TempDir;

/// Config with the database and storage directory inside `dir`
#[allow(dead_code)]
pub fn config_in(dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.persistence.database_path = dir.path().join("jobs.db");
    config.download.download_dir = dir.path().join("downloads");
    config
}

/// Downloader over `engine` with all state in a fresh temp dir
#[allow(dead_code)]
pub async fn create_downloader(engine: Arc<dyn FetchEngine>) -> (Arc<MediaDownloader>, TempDir) {
    let temp_dir = tempfile::tempdir().expect("create temp dir");
    let downloader = MediaDownloader::new_with_engine(config_in(&temp_dir), engine)
        .await
        .expect("create downloader");
    (Arc::new(downloader), temp_dir)
}
