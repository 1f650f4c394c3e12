//! Core types for media-dl

use base64::Engine as _;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Unique identifier for a fetch job
///
/// Generated once at submission time (UUID v4) and never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub Uuid);

impl JobId {
    /// Allocate a fresh random identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Reversible display form handed to clients in file listings
    ///
    /// Plain base64 of the hyphenated id. This is an encoding, not a secret.
    pub fn encoded(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(self.0.to_string())
    }

    /// Inverse of [`JobId::encoded`]
    pub fn from_encoded(encoded: &str) -> Option<Self> {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .ok()?;
        let text = String::from_utf8(bytes).ok()?;
        text.parse().ok()
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for JobId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl From<Uuid> for JobId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

// Stored as hyphenated TEXT so the database stays readable with the sqlite shell
impl sqlx::Type<sqlx::Sqlite> for JobId {
    fn type_info() -> sqlx::sqlite::SqliteTypeInfo {
        <String as sqlx::Type<sqlx::Sqlite>>::type_info()
    }

    fn compatible(ty: &sqlx::sqlite::SqliteTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Sqlite>>::compatible(ty)
    }
}

impl<'q> sqlx::Encode<'q, sqlx::Sqlite> for JobId {
    fn encode_by_ref(
        &self,
        buf: &mut Vec<sqlx::sqlite::SqliteArgumentValue<'q>>,
    ) -> Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
        sqlx::Encode::<sqlx::Sqlite>::encode(self.0.to_string(), buf)
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Sqlite> for JobId {
    fn decode(value: sqlx::sqlite::SqliteValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let text = <String as sqlx::Decode<sqlx::Sqlite>>::decode(value)?;
        Ok(Self(Uuid::parse_str(&text)?))
    }
}

/// Job status
///
/// `Downloading` is the initial state. Engines may report any number of
/// intermediate phase labels (merging, post-processing, ...) which are kept
/// verbatim in [`JobStatus::Phase`]. `Completed`, `Failed` and `Cancelled`
/// are terminal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum JobStatus {
    /// Transfer in progress (initial state)
    Downloading,
    /// Engine-reported intermediate phase
    Phase(String),
    /// Job finished
    Completed,
    /// Fetch failed (only written when strict failure reporting is enabled)
    Failed,
    /// Job was cancelled before the fetch finished
    Cancelled,
}

impl JobStatus {
    /// Label persisted in the store and returned by the API
    pub fn as_str(&self) -> &str {
        match self {
            JobStatus::Downloading => "Downloading",
            JobStatus::Phase(name) => name,
            JobStatus::Completed => "Completed",
            JobStatus::Failed => "Failed",
            JobStatus::Cancelled => "Cancelled",
        }
    }

    /// Parse a stored label; anything unrecognized is an engine phase
    pub fn parse(label: &str) -> Self {
        match label {
            "Downloading" => JobStatus::Downloading,
            "Completed" => JobStatus::Completed,
            "Failed" => JobStatus::Failed,
            "Cancelled" => JobStatus::Cancelled,
            other => JobStatus::Phase(other.to_string()),
        }
    }

    /// Whether no further transition can occur from this status
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled
        )
    }

    /// Labels of every terminal status, for store-side guards
    pub const TERMINAL_LABELS: [&'static str; 3] = ["Completed", "Failed", "Cancelled"];
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for JobStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for JobStatus {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(JobStatus::parse(&label))
    }
}

/// Event emitted during the job lifecycle
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Job accepted and recorded
    Queued {
        /// Job ID
        #[schema(value_type = String)]
        id: JobId,
        /// Source URL
        url: String,
    },

    /// Progress update persisted for a job
    Progress {
        /// Job ID
        #[schema(value_type = String)]
        id: JobId,
        /// Status label after the update
        #[schema(value_type = String)]
        status: JobStatus,
        /// Progress percentage (0.0 to 100.0)
        percent: f64,
    },

    /// Job reached `Completed`
    Completed {
        /// Job ID
        #[schema(value_type = String)]
        id: JobId,
        /// Artifact file name (empty when the fetch failed)
        file_name: String,
        /// Media title
        title: String,
        /// Fetch failure, if any, hidden behind the `Completed` status
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },

    /// Job reached `Failed`
    Failed {
        /// Job ID
        #[schema(value_type = String)]
        id: JobId,
        /// Error message
        error: String,
    },

    /// Job was cancelled
    Cancelled {
        /// Job ID
        #[schema(value_type = String)]
        id: JobId,
    },

    /// Job record (and artifact) removed
    Removed {
        /// Job ID
        #[schema(value_type = String)]
        id: JobId,
    },

    /// Every job and artifact removed
    Cleared {
        /// Number of job records deleted
        jobs_removed: u64,
        /// Number of files deleted from the storage directory
        files_removed: u64,
    },

    /// Downloader is shutting down
    Shutdown,
}

/// A completed job as exposed in file listings
#[derive(Clone, Debug, PartialEq)]
pub struct ArtifactInfo {
    /// Job ID
    pub id: JobId,
    /// Artifact file name (`<id>.<ext>`)
    pub file_name: String,
    /// Media title
    pub title: String,
    /// Source URL
    pub url: String,
    /// Display form of the id, see [`JobId::encoded`]
    pub encoded_id: String,
}

/// Counts reported by a bulk clear
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ClearSummary {
    /// Number of job records deleted
    pub jobs_removed: u64,
    /// Number of files deleted from the storage directory
    pub files_removed: u64,
}
