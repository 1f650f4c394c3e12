//! Job lifecycle through the public library API
//!
//! Drives `MediaDownloader` with an in-process engine: submission, progress,
//! terminal states, artifacts, cancellation and restart.

mod common;

use common::{
    FakeEngine, MEDIA_BYTES, assert_non_decreasing, collect_events_until, config_in,
    create_downloader, progress_percents, wait_for_terminal,
};
use media_dl::{Error, Event, FetchError, JobError, JobStatus, MediaDownloader};
use std::sync::Arc;
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::test]
async fn submit_poll_complete_and_fetch_artifact() {
    let (downloader, _temp_dir) =
        create_downloader(Arc::new(FakeEngine::succeeding("webm", "Big Buck Bunny"))).await;
    let mut events = downloader.subscribe();

    let id = downloader.submit("https://media.example/watch?v=1").await.unwrap();

    let initial = downloader.get_job(id).await.unwrap().unwrap();
    assert_eq!(initial.url, "https://media.example/watch?v=1");
    assert_eq!(initial.file_name, "");

    let job = wait_for_terminal(&downloader, id, TIMEOUT).await;
    assert_eq!(job.status(), JobStatus::Completed);
    assert_eq!(job.percent, 100.0);
    assert_eq!(job.title, "Big Buck Bunny");
    assert_eq!(job.file_name, format!("{}.webm", id));

    let (path, name) = downloader.artifact(id).await.unwrap();
    assert_eq!(name, job.file_name);
    assert_eq!(std::fs::read(path).unwrap(), MEDIA_BYTES);

    let seen = collect_events_until(&mut events, TIMEOUT, |event| {
        matches!(event, Event::Completed { .. })
    })
    .await;
    assert!(matches!(seen.first(), Some(Event::Queued { .. })));
    assert_non_decreasing(&progress_percents(&seen, id));
}

#[tokio::test]
async fn same_url_twice_gives_independent_jobs() {
    let (downloader, _temp_dir) =
        create_downloader(Arc::new(FakeEngine::succeeding("mp4", "Clip"))).await;

    let a = downloader.submit("https://media.example/v").await.unwrap();
    let b = downloader.submit("https://media.example/v").await.unwrap();
    assert_ne!(a, b);

    let job_a = wait_for_terminal(&downloader, a, TIMEOUT).await;
    let job_b = wait_for_terminal(&downloader, b, TIMEOUT).await;
    assert_ne!(job_a.file_name, job_b.file_name);
    assert_eq!(downloader.list_completed().await.unwrap().len(), 2);
}

#[tokio::test]
async fn concurrent_jobs_have_independent_progress() {
    let engine = FakeEngine::succeeding("mp4", "Clip").with_step_delay(Duration::from_millis(20));
    let (downloader, _temp_dir) = create_downloader(Arc::new(engine)).await;
    let mut events = downloader.subscribe();

    let a = downloader.submit("https://media.example/a").await.unwrap();
    let b = downloader.submit("https://media.example/b").await.unwrap();

    let mut completed = 0;
    let seen = collect_events_until(&mut events, TIMEOUT, |event| {
        if matches!(event, Event::Completed { .. }) {
            completed += 1;
        }
        completed == 2
    })
    .await;

    for id in [a, b] {
        let percents = progress_percents(&seen, id);
        assert!(!percents.is_empty());
        assert_non_decreasing(&percents);
        assert_eq!(percents.last().copied(), Some(100.0));
    }
}

#[tokio::test]
async fn failed_fetch_completes_with_error_by_default() {
    let (downloader, _temp_dir) = create_downloader(Arc::new(FakeEngine::failing(
        FetchError::UnsupportedUrl("https://media.example/page".into()),
    )))
    .await;

    let id = downloader.submit("https://media.example/page").await.unwrap();
    let job = wait_for_terminal(&downloader, id, TIMEOUT).await;

    assert_eq!(job.status(), JobStatus::Completed);
    assert_eq!(job.file_name, "");
    assert!(job.error.is_some());
    assert!(matches!(
        downloader.artifact(id).await,
        Err(Error::Job(JobError::ArtifactMissing { .. }))
    ));
}

#[tokio::test]
async fn failed_fetch_is_failed_in_strict_mode() {
    let temp_dir = tempfile::tempdir().unwrap();
    let mut config = config_in(&temp_dir);
    config.download.strict_failures = true;

    let engine = Arc::new(FakeEngine::failing(FetchError::Network("reset".into())));
    let downloader = MediaDownloader::new_with_engine(config, engine).await.unwrap();

    let id = downloader.submit("https://media.example/v").await.unwrap();
    let job = wait_for_terminal(&downloader, id, TIMEOUT).await;
    assert_eq!(job.status(), JobStatus::Failed);
}

#[tokio::test]
async fn cancel_stops_a_running_job() {
    let (downloader, _temp_dir) = create_downloader(Arc::new(FakeEngine::hanging())).await;

    let id = downloader.submit("https://media.example/v").await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    downloader.cancel(id).await.unwrap();

    let job = wait_for_terminal(&downloader, id, TIMEOUT).await;
    assert_eq!(job.status(), JobStatus::Cancelled);
    assert_eq!(downloader.active_job_count().await, 0);
}

#[tokio::test]
async fn delete_and_clear_remove_everything() {
    let (downloader, _temp_dir) =
        create_downloader(Arc::new(FakeEngine::succeeding("mp4", "Clip"))).await;

    let first = downloader.submit("https://media.example/1").await.unwrap();
    let second = downloader.submit("https://media.example/2").await.unwrap();
    wait_for_terminal(&downloader, first, TIMEOUT).await;
    wait_for_terminal(&downloader, second, TIMEOUT).await;

    let (path, _) = downloader.artifact(first).await.unwrap();
    downloader.delete(first).await.unwrap();
    assert!(!path.exists());
    assert!(matches!(
        downloader.artifact(first).await,
        Err(Error::Job(JobError::NotFound { .. }))
    ));

    let summary = downloader.clear_all().await.unwrap();
    assert_eq!(summary.jobs_removed, 1);
    assert_eq!(summary.files_removed, 1);
    assert!(downloader.list_completed().await.unwrap().is_empty());
    assert!(downloader.list_jobs().await.unwrap().is_empty());
}

#[tokio::test]
async fn interrupted_job_resumes_after_restart() {
    let temp_dir = tempfile::tempdir().unwrap();

    let id = {
        let downloader =
            MediaDownloader::new_with_engine(config_in(&temp_dir), Arc::new(FakeEngine::hanging()))
                .await
                .unwrap();
        let id = downloader.submit("https://media.example/long").await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        downloader.shutdown().await.unwrap();

        assert!(matches!(
            downloader.submit("https://media.example/late").await,
            Err(Error::ShuttingDown)
        ));
        id
    };

    let engine = Arc::new(FakeEngine::succeeding("mkv", "Long"));
    let downloader = MediaDownloader::new_with_engine(config_in(&temp_dir), engine.clone())
        .await
        .unwrap();

    let job = wait_for_terminal(&downloader, id, TIMEOUT).await;
    assert_eq!(job.status(), JobStatus::Completed);
    assert_eq!(job.file_name, format!("{}.mkv", id));
    assert_eq!(engine.calls(), 1);
}

#[tokio::test]
async fn batch_fetch_reports_failures_without_stopping() {
    let temp_dir = tempfile::tempdir().unwrap();
    let mut config = config_in(&temp_dir);
    config.download.max_concurrent_fetches = Some(4);
    let downloader =
        MediaDownloader::new_with_engine(config, Arc::new(FakeEngine::succeeding("mp4", "Clip")))
            .await
            .unwrap();

    let items = downloader
        .fetch_batch(&["https://media.example/1", "", "https://media.example/2"])
        .await;

    assert_eq!(items.len(), 3);
    assert!(items[0].failure().is_none());
    assert!(matches!(items[1].outcome, Err(Error::InvalidUrl(_))));
    assert!(items[2].failure().is_none());
    assert_eq!(downloader.list_completed().await.unwrap().len(), 2);
}
