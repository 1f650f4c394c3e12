//! Error types for media-dl
//!
//! This module provides error handling for the library, including:
//! - Domain-specific error types (Job, Fetch, Database)
//! - HTTP status code mapping for API integration
//! - Structured error responses with machine-readable error codes

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for media-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for media-dl
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "download_dir")
        key: Option<String>,
    },

    /// Database operation failed
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// Job-related error (unknown id, missing artifact)
    #[error("job error: {0}")]
    Job(#[from] JobError),

    /// The fetch engine failed
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Submitted URL is empty or cannot be parsed
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Shutdown in progress - not accepting new jobs
    #[error("shutdown in progress: not accepting new jobs")]
    ShuttingDown,

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),
}

/// Database-related errors
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to connect to database
    #[error("failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Failed to run migrations
    #[error("failed to run migrations: {0}")]
    MigrationFailed(String),

    /// Query failed
    #[error("query failed: {0}")]
    QueryFailed(String),
}

/// Job-related errors
#[derive(Debug, Error)]
pub enum JobError {
    /// No job with this id exists
    #[error("job {id} not found")]
    NotFound {
        /// The job id that was not found
        id: String,
    },

    /// Job exists but its artifact is not on disk
    #[error("artifact for job {id} not found")]
    ArtifactMissing {
        /// The job whose artifact is missing
        id: String,
        /// The path where the artifact was expected
        path: PathBuf,
    },

    /// Cannot perform operation in current state
    #[error("cannot {operation} job {id} in state {current_state}")]
    InvalidState {
        /// The job id
        id: String,
        /// The operation that was attempted (e.g., "cancel")
        operation: String,
        /// The current state that prevents the operation
        current_state: String,
    },
}

/// Failures reported by a fetch engine
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// The engine does not know how to handle this URL
    #[error("unsupported URL: {0}")]
    UnsupportedUrl(String),

    /// Network failure while retrieving the media
    #[error("network failure: {0}")]
    Network(String),

    /// Writing the artifact to disk failed
    #[error("disk error: {0}")]
    Disk(String),

    /// No engine is installed or configured
    #[error("fetch engine unavailable: {0}")]
    EngineUnavailable(String),

    /// The engine ran but exited unsuccessfully
    #[error("fetch engine failed: {0}")]
    Engine(String),

    /// The fetch was cancelled before it finished
    #[error("fetch cancelled")]
    Cancelled,
}

/// API error response format
///
/// This structure is returned by API endpoints when an error occurs.
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": {
///     "code": "job_not_found",
///     "message": "job error: job 3f0c... not found",
///     "details": {
///       "job_id": "3f0c..."
///     }
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// The error details
    pub error: ErrorDetail,
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "job_not_found", "invalid_url")
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional context about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    /// Create an "internal server error"
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("internal_error", message)
    }
}

/// Convert errors to HTTP status codes for API responses
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request
            Error::Config { .. } => 400,
            Error::InvalidUrl(_) => 400,

            // 404 Not Found
            Error::Job(JobError::NotFound { .. }) => 404,
            Error::Job(JobError::ArtifactMissing { .. }) => 404,

            // 409 Conflict
            Error::Job(JobError::InvalidState { .. }) => 409,

            // 422 Unprocessable Entity
            Error::Fetch(FetchError::UnsupportedUrl(_)) => 422,

            // 502 Bad Gateway - the engine talks to remote hosts
            Error::Fetch(FetchError::Network(_)) => 502,
            Error::Fetch(FetchError::Engine(_)) => 502,

            // 503 Service Unavailable
            Error::ShuttingDown => 503,
            Error::Fetch(FetchError::EngineUnavailable(_)) => 503,

            // 500 Internal Server Error
            Error::Fetch(FetchError::Disk(_)) => 500,
            Error::Fetch(FetchError::Cancelled) => 500,
            Error::Database(_) => 500,
            Error::Io(_) => 500,
            Error::ApiServerError(_) => 500,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Database(_) => "database_error",
            Error::Job(e) => match e {
                JobError::NotFound { .. } => "job_not_found",
                JobError::ArtifactMissing { .. } => "artifact_not_found",
                JobError::InvalidState { .. } => "invalid_state",
            },
            Error::Fetch(e) => match e {
                FetchError::UnsupportedUrl(_) => "unsupported_url",
                FetchError::Network(_) => "network_error",
                FetchError::Disk(_) => "disk_error",
                FetchError::EngineUnavailable(_) => "engine_unavailable",
                FetchError::Engine(_) => "engine_error",
                FetchError::Cancelled => "cancelled",
            },
            Error::InvalidUrl(_) => "invalid_url",
            Error::Io(_) => "io_error",
            Error::ShuttingDown => "shutting_down",
            Error::ApiServerError(_) => "api_server_error",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let code = error.error_code().to_string();
        let message = error.to_string();

        let details = match &error {
            Error::Job(JobError::NotFound { id }) => Some(serde_json::json!({
                "job_id": id,
            })),
            Error::Job(JobError::ArtifactMissing { id, .. }) => Some(serde_json::json!({
                "job_id": id,
            })),
            Error::Job(JobError::InvalidState {
                id,
                operation,
                current_state,
            }) => Some(serde_json::json!({
                "job_id": id,
                "operation": operation,
                "current_state": current_state,
            })),
            Error::Config { key: Some(key), .. } => Some(serde_json::json!({
                "key": key,
            })),
            _ => None,
        };

        ApiError {
            error: ErrorDetail {
                code,
                message,
                details,
            },
        }
    }
}
