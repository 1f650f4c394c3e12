//! Waiting helpers and assertions for integration tests

use media_dl::{Event, Job, JobId, MediaDownloader};
use std::time::Duration;

/// Poll the store until the job's terminal state has been written
pub async fn wait_for_terminal(downloader: &MediaDownloader, id: JobId, timeout: Duration) -> Job {
    let result = tokio::time::timeout(timeout, async {
        loop {
            if let Ok(Some(job)) = downloader.get_job(id).await
                && job.status().is_terminal()
                && job.completed_at.is_some()
            {
                return job;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;

    match result {
        Ok(job) => job,
        Err(_) => panic!("job {} did not finish within {:?}", id, timeout),
    }
}

/// Collect events from `events` until `stop` matches one (inclusive) or time runs out
pub async fn collect_events_until<F>(
    events: &mut tokio::sync::broadcast::Receiver<Event>,
    timeout: Duration,
    mut stop: F,
) -> Vec<Event>
where
    F: FnMut(&Event) -> bool,
{
    let mut collected = Vec::new();

    let _ = tokio::time::timeout(timeout, async {
        while let Ok(event) = events.recv().await {
            let done = stop(&event);
            collected.push(event);
            if done {
                break;
            }
        }
    })
    .await;

    collected
}

/// Percentages of the `Progress` events for `id`, in arrival order
pub fn progress_percents(events: &[Event], id: JobId) -> Vec<f64> {
    events
        .iter()
        .filter_map(|event| match event {
            Event::Progress {
                id: event_id,
                percent,
                ..
            } if *event_id == id => Some(*percent),
            _ => None,
        })
        .collect()
}

/// Assert that a sequence never decreases
pub fn assert_non_decreasing(values: &[f64]) {
    for pair in values.windows(2) {
        assert!(
            pair[0] <= pair[1],
            "sequence decreased from {} to {}: {:?}",
            pair[0],
            pair[1],
            values
        );
    }
}
