//! OpenAPI documentation and schema generation
//!
//! The specification is generated at compile time with utoipa.

use utoipa::OpenApi;

/// OpenAPI documentation for the media-dl REST API
///
/// Served at:
/// - `/openapi.json` - JSON format OpenAPI specification
/// - `/swagger-ui` - Interactive Swagger UI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "media-dl REST API",
        version = "0.1.0",
        description = "Submit media URLs for background fetching, poll their progress and retrieve the resulting files",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:8000", description = "Local development server")
    ),
    paths(
        // Jobs
        crate::api::routes::submit_download,
        crate::api::routes::get_progress,
        crate::api::routes::cancel_job,

        // Files
        crate::api::routes::list_files,
        crate::api::routes::download_file,
        crate::api::routes::delete_file,
        crate::api::routes::clear_downloads,

        // System
        crate::api::routes::health_check,
        crate::api::routes::openapi_spec,
        crate::api::routes::event_stream,
    ),
    components(schemas(
        crate::types::Event,
        crate::types::ClearSummary,

        crate::config::Config,
        crate::config::DownloadConfig,
        crate::config::FetchConfig,
        crate::config::RetryConfig,
        crate::config::PersistenceConfig,
        crate::config::ServerIntegrationConfig,
        crate::config::ApiConfig,

        crate::api::routes::DownloadRequest,
        crate::api::routes::DownloadStarted,
        crate::api::routes::JobProgress,
        crate::api::routes::FileEntry,
        crate::api::routes::FileList,
        crate::api::routes::MessageResponse,

        crate::error::ApiError,
        crate::error::ErrorDetail,
    )),
    tags(
        (name = "jobs", description = "Job submission, progress polling and cancellation"),
        (name = "files", description = "Completed artifacts - list, download, delete and clear"),
        (name = "system", description = "System endpoints - Health checks, OpenAPI spec, events"),
    )
)]
pub struct ApiDoc;
