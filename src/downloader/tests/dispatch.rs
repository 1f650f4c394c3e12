use super::*;
use crate::downloader::dispatch::validate_url;

#[tokio::test]
async fn test_submit_records_initial_job() {
    let engine = Arc::new(ScriptedEngine::succeeding("mp4", "Clip").steps(vec![Step::WaitForCancel]));
    let (downloader, _temp_dir) = create_test_downloader(engine).await;

    let id = downloader
        .submit("https://example.com/watch?v=1")
        .await
        .unwrap();

    let job = downloader.get_job(id).await.unwrap().unwrap();
    assert_eq!(job.url, "https://example.com/watch?v=1");
    assert_eq!(job.status(), JobStatus::Downloading);
    assert_eq!(job.percent, 0.0);
    assert_eq!(job.file_name, "");
    assert_eq!(job.title, "");

    downloader.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_submit_returns_before_fetch_finishes() {
    let engine = Arc::new(ScriptedEngine::succeeding("mp4", "Clip").steps(vec![Step::WaitForCancel]));
    let (downloader, _temp_dir) = create_test_downloader(engine).await;

    // Would hang if submit awaited the fetch
    let id = tokio::time::timeout(
        Duration::from_secs(2),
        downloader.submit("https://example.com/v"),
    )
    .await
    .expect("submit blocked on the fetch")
    .unwrap();

    assert_eq!(downloader.active_job_count().await, 1);
    assert!(downloader.get_job(id).await.unwrap().is_some());

    downloader.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_same_url_twice_creates_independent_jobs() {
    let engine = Arc::new(ScriptedEngine::succeeding("mp4", "Clip"));
    let (downloader, _temp_dir) = create_test_downloader(engine).await;

    let a = downloader.submit("https://example.com/same").await.unwrap();
    let b = downloader.submit("https://example.com/same").await.unwrap();
    assert_ne!(a, b);

    let job_a = wait_for_terminal(&downloader, a).await;
    let job_b = wait_for_terminal(&downloader, b).await;
    assert_eq!(job_a.file_name, format!("{}.mp4", a));
    assert_eq!(job_b.file_name, format!("{}.mp4", b));
}

#[tokio::test]
async fn test_submit_emits_queued_event() {
    let engine = Arc::new(ScriptedEngine::succeeding("mp4", "Clip"));
    let (downloader, _temp_dir) = create_test_downloader(engine).await;
    let mut events = downloader.subscribe();

    let id = downloader.submit("https://example.com/v").await.unwrap();

    match events.recv().await.unwrap() {
        Event::Queued { id: queued, url } => {
            assert_eq!(queued, id);
            assert_eq!(url, "https://example.com/v");
        }
        other => panic!("expected Queued first, got {:?}", other),
    }
}

#[tokio::test]
async fn test_submit_rejects_invalid_url() {
    let engine = Arc::new(ScriptedEngine::succeeding("mp4", "Clip"));
    let (downloader, _temp_dir) = create_test_downloader(engine.clone()).await;

    for bad in ["", "   ", "not a url", "https://"] {
        let result = downloader.submit(bad).await;
        assert!(
            matches!(result, Err(Error::InvalidUrl(_))),
            "{:?} should be rejected, got {:?}",
            bad,
            result
        );
    }

    assert!(downloader.list_jobs().await.unwrap().is_empty());
    assert_eq!(engine.attempts(), 0);
}

#[tokio::test]
async fn test_submit_rejected_after_shutdown() {
    let engine = Arc::new(ScriptedEngine::succeeding("mp4", "Clip"));
    let (downloader, _temp_dir) = create_test_downloader(engine).await;

    downloader.shutdown().await.unwrap();

    let result = downloader.submit("https://example.com/v").await;
    assert!(matches!(result, Err(Error::ShuttingDown)));
}

#[tokio::test]
async fn test_concurrency_bound_limits_running_fetches() {
    let engine = Arc::new(
        ScriptedEngine::succeeding("mp4", "Clip").steps(vec![Step::Sleep(Duration::from_millis(200))]),
    );
    let (downloader, _temp_dir) = create_test_downloader_with(engine.clone(), |config| {
        config.download.max_concurrent_fetches = Some(1);
    })
    .await;

    let first = downloader.submit("https://example.com/1").await.unwrap();
    let second = downloader.submit("https://example.com/2").await.unwrap();

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(engine.attempts(), 1, "second fetch must wait for a slot");

    wait_for_terminal(&downloader, first).await;
    wait_for_terminal(&downloader, second).await;
    assert_eq!(engine.attempts(), 2);
}

#[test]
fn test_validate_url_trims_whitespace() {
    assert_eq!(
        validate_url("  https://example.com/v \n").unwrap(),
        "https://example.com/v"
    );
}
