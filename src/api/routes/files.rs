//! Artifact handlers: listing, streaming, deleting and clearing.

use super::{FileEntry, FileList, MessageResponse, parse_job_id};
use crate::api::AppState;
use crate::error::{Error, JobError};
use axum::{
    Json,
    body::Body,
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};
use tokio_util::io::ReaderStream;

/// GET /list-files - List completed jobs
///
/// Returns `{"message": "No files available"}` when nothing has completed.
#[utoipa::path(
    get,
    path = "/list-files",
    tag = "files",
    responses(
        (status = 200, description = "Completed jobs, or {\"message\": \"No files available\"}", body = FileList),
        (status = 500, description = "Internal server error", body = crate::error::ApiError)
    )
)]
pub async fn list_files(State(state): State<AppState>) -> Result<Response, Error> {
    let completed = state.downloader.list_completed().await?;

    if completed.is_empty() {
        return Ok(Json(MessageResponse::new("No files available")).into_response());
    }

    let files = completed
        .into_iter()
        .map(|info| FileEntry {
            file_name_encoded: info.encoded_id,
            original_file_name: info.file_name,
            id: info.id.to_string(),
            title: info.title,
            url: info.url,
        })
        .collect();

    Ok(Json(FileList { files }).into_response())
}

/// GET /download/:id - Stream a job's artifact
#[utoipa::path(
    get,
    path = "/download/{id}",
    tag = "files",
    params(
        ("id" = String, Path, description = "Job ID")
    ),
    responses(
        (status = 200, description = "Artifact bytes", content_type = "application/octet-stream"),
        (status = 404, description = "Job or file not found", body = crate::error::ApiError)
    )
)]
pub async fn download_file(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, Error> {
    let job_id = parse_job_id(&id).ok_or(Error::Job(JobError::NotFound { id }))?;

    let (path, file_name) = state.downloader.artifact(job_id).await?;

    // The file can vanish between the existence check and the open
    let file = match tokio::fs::File::open(&path).await {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!(job_id = %job_id, path = %path.display(), "Artifact removed before it could be served");
            return Err(Error::Job(JobError::ArtifactMissing {
                id: job_id.to_string(),
                path,
            }));
        }
        Err(e) => return Err(Error::Io(e)),
    };
    let length = file.metadata().await?.len();

    tracing::info!(job_id = %job_id, file = %file_name, bytes = length, "Serving artifact");

    let headers = [
        (header::CONTENT_TYPE, "application/octet-stream".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", file_name),
        ),
        (header::CONTENT_LENGTH, length.to_string()),
    ];

    Ok((headers, Body::from_stream(ReaderStream::new(file))).into_response())
}

/// DELETE /delete/:id - Delete a job and its artifact
#[utoipa::path(
    delete,
    path = "/delete/{id}",
    tag = "files",
    params(
        ("id" = String, Path, description = "Job ID")
    ),
    responses(
        (status = 200, description = "Job and artifact deleted", body = MessageResponse),
        (status = 404, description = "Job not found", body = crate::error::ApiError)
    )
)]
pub async fn delete_file(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, Error> {
    let job_id = parse_job_id(&id).ok_or(Error::Job(JobError::NotFound { id }))?;

    state.downloader.delete(job_id).await?;

    Ok(Json(MessageResponse::new("File deleted successfully")))
}

/// DELETE /clear_downloads - Delete every job and artifact
#[utoipa::path(
    delete,
    path = "/clear_downloads",
    tag = "files",
    responses(
        (status = 200, description = "Everything cleared", body = MessageResponse),
        (status = 500, description = "Internal server error", body = crate::error::ApiError)
    )
)]
pub async fn clear_downloads(State(state): State<AppState>) -> Result<Json<MessageResponse>, Error> {
    let summary = state.downloader.clear_all().await?;

    tracing::info!(
        jobs_removed = summary.jobs_removed,
        files_removed = summary.files_removed,
        "Cleared downloads"
    );

    Ok(Json(MessageResponse::new(
        "All downloads and records cleared successfully",
    )))
}
