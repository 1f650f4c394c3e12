//! Job submission, progress polling and cancellation handlers.

use super::{DownloadRequest, DownloadStarted, JobProgress, MessageResponse, parse_job_id};
use crate::api::AppState;
use crate::error::{Error, JobError};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// POST /download - Submit a URL for fetching
///
/// Returns as soon as the job is recorded; the fetch runs in the background.
#[utoipa::path(
    post,
    path = "/download",
    tag = "jobs",
    request_body = DownloadRequest,
    responses(
        (status = 200, description = "Job recorded and fetch started", body = DownloadStarted),
        (status = 400, description = "Empty or malformed URL", body = crate::error::ApiError),
        (status = 503, description = "Server is shutting down", body = crate::error::ApiError)
    )
)]
pub async fn submit_download(
    State(state): State<AppState>,
    Json(request): Json<DownloadRequest>,
) -> Response {
    match state.downloader.submit(&request.url).await {
        Ok(id) => (
            StatusCode::OK,
            Json(DownloadStarted {
                message: "Download started".to_string(),
                download_id: id.to_string(),
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::warn!(url = %request.url, error = %e, "Rejected submission");
            e.into_response()
        }
    }
}

/// GET /progress/:id - Poll a job
///
/// Unknown ids are not an error: the body is `{"status": "No progress found"}`.
#[utoipa::path(
    get,
    path = "/progress/{id}",
    tag = "jobs",
    params(
        ("id" = String, Path, description = "Job ID")
    ),
    responses(
        (status = 200, description = "Job progress, or {\"status\": \"No progress found\"}", body = JobProgress),
        (status = 500, description = "Internal server error", body = crate::error::ApiError)
    )
)]
pub async fn get_progress(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let Some(job_id) = parse_job_id(&id) else {
        return no_progress();
    };

    match state.downloader.get_job(job_id).await {
        Ok(Some(job)) => Json(JobProgress {
            url: job.url,
            status: job.status,
            percent: job.percent,
            title: job.title,
            error: job.error,
        })
        .into_response(),
        Ok(None) => no_progress(),
        Err(e) => e.into_response(),
    }
}

fn no_progress() -> Response {
    Json(json!({ "status": "No progress found" })).into_response()
}

/// POST /cancel/:id - Cancel a job that has not finished
#[utoipa::path(
    post,
    path = "/cancel/{id}",
    tag = "jobs",
    params(
        ("id" = String, Path, description = "Job ID")
    ),
    responses(
        (status = 200, description = "Cancellation requested", body = MessageResponse),
        (status = 404, description = "Job not found", body = crate::error::ApiError),
        (status = 409, description = "Job already finished", body = crate::error::ApiError)
    )
)]
pub async fn cancel_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, Error> {
    let job_id = parse_job_id(&id).ok_or(Error::Job(JobError::NotFound { id }))?;

    state.downloader.cancel(job_id).await?;

    Ok(Json(MessageResponse::new("Cancellation requested")))
}
