//! Job record CRUD operations.

use crate::error::DatabaseError;
use crate::types::{JobId, JobStatus};
use crate::{Error, Result};
use sqlx::{QueryBuilder, Sqlite};

use super::{Database, Job, JobUpdate, NewJob};

const JOB_COLUMNS: &str = r#"
    id, url, file_name, status, percent, title, error,
    created_at, updated_at, completed_at
"#;

fn query_failed(context: &str, e: sqlx::Error) -> Error {
    Error::Database(DatabaseError::QueryFailed(format!("{}: {}", context, e)))
}

impl Database {
    /// Insert a new job record (status `Downloading`, percent 0, empty name/title)
    pub async fn insert_job(&self, job: &NewJob) -> Result<()> {
        let now = chrono::Utc::now().timestamp();

        sqlx::query(
            r#"
            INSERT INTO jobs (
                id, url, file_name, status, percent, title,
                created_at, updated_at
            ) VALUES (?, ?, '', ?, 0.0, '', ?, ?)
            "#,
        )
        .bind(job.id)
        .bind(&job.url)
        .bind(JobStatus::Downloading.as_str())
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| query_failed("Failed to insert job", e))?;

        Ok(())
    }

    /// Get a job by ID
    pub async fn get_job(&self, id: JobId) -> Result<Option<Job>> {
        let sql = format!("SELECT {} FROM jobs WHERE id = ?", JOB_COLUMNS);
        sqlx::query_as::<_, Job>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| query_failed("Failed to get job", e))
    }

    /// List all jobs, oldest first
    pub async fn list_jobs(&self) -> Result<Vec<Job>> {
        let sql = format!("SELECT {} FROM jobs ORDER BY created_at ASC", JOB_COLUMNS);
        sqlx::query_as::<_, Job>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| query_failed("Failed to list jobs", e))
    }

    /// List jobs with a specific status, oldest first
    pub async fn list_jobs_by_status(&self, status: &JobStatus) -> Result<Vec<Job>> {
        let sql = format!(
            "SELECT {} FROM jobs WHERE status = ? ORDER BY created_at ASC",
            JOB_COLUMNS
        );
        sqlx::query_as::<_, Job>(&sql)
            .bind(status.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| query_failed("Failed to list jobs by status", e))
    }

    /// Jobs not yet in a terminal status (for restore on startup)
    pub async fn list_incomplete_jobs(&self) -> Result<Vec<Job>> {
        let sql = format!(
            "SELECT {} FROM jobs WHERE status NOT IN (?, ?, ?) ORDER BY created_at ASC",
            JOB_COLUMNS
        );
        let [a, b, c] = JobStatus::TERMINAL_LABELS;
        sqlx::query_as::<_, Job>(&sql)
            .bind(a)
            .bind(b)
            .bind(c)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| query_failed("Failed to list incomplete jobs", e))
    }

    /// Write the named fields of a job
    ///
    /// Returns `false` if no job with this id exists.
    pub async fn update_job(&self, id: JobId, update: &JobUpdate) -> Result<bool> {
        self.write_update(id, update, false).await
    }

    /// Terminal write: named fields plus the completion timestamp
    ///
    /// This is the only write allowed to replace a terminal status.
    pub async fn finalize_job(&self, id: JobId, update: &JobUpdate) -> Result<bool> {
        self.write_update(id, update, true).await
    }

    async fn write_update(&self, id: JobId, update: &JobUpdate, terminal: bool) -> Result<bool> {
        if update.is_empty() && !terminal {
            return Ok(self.get_job(id).await?.is_some());
        }

        let now = chrono::Utc::now().timestamp();
        let mut query = QueryBuilder::<Sqlite>::new("UPDATE jobs SET updated_at = ");
        query.push_bind(now);

        if let Some(file_name) = &update.file_name {
            query.push(", file_name = ").push_bind(file_name.clone());
        }
        if let Some(title) = &update.title {
            query.push(", title = ").push_bind(title.clone());
        }
        if let Some(status) = &update.status {
            query
                .push(", status = ")
                .push_bind(status.as_str().to_string());
        }
        if let Some(percent) = update.percent {
            query.push(", percent = ").push_bind(percent.clamp(0.0, 100.0));
        }
        if let Some(error) = &update.error {
            query.push(", error = ").push_bind(error.clone());
        }
        if terminal {
            query.push(", completed_at = ").push_bind(now);
        }

        query.push(" WHERE id = ").push_bind(id);

        let result = query
            .build()
            .execute(&self.pool)
            .await
            .map_err(|e| query_failed("Failed to update job", e))?;

        Ok(result.rows_affected() > 0)
    }

    /// Persist one progress transition
    ///
    /// The write is skipped once the job is terminal, and the stored percent
    /// never goes down, so replaying an event leaves the same values behind.
    /// Returns `false` when nothing was written.
    pub async fn apply_progress(&self, id: JobId, status: &JobStatus, percent: f64) -> Result<bool> {
        let now = chrono::Utc::now().timestamp();
        let [a, b, c] = JobStatus::TERMINAL_LABELS;

        let result = sqlx::query(
            r#"
            UPDATE jobs
            SET status = ?, percent = MAX(percent, ?), updated_at = ?
            WHERE id = ? AND status NOT IN (?, ?, ?)
            "#,
        )
        .bind(status.as_str())
        .bind(percent.clamp(0.0, 100.0))
        .bind(now)
        .bind(id)
        .bind(a)
        .bind(b)
        .bind(c)
        .execute(&self.pool)
        .await
        .map_err(|e| query_failed("Failed to update progress", e))?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete a job; returns `false` if it did not exist
    pub async fn delete_job(&self, id: JobId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM jobs WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| query_failed("Failed to delete job", e))?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete every job record, returning how many were removed
    pub async fn delete_all_jobs(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM jobs")
            .execute(&self.pool)
            .await
            .map_err(|e| query_failed("Failed to clear jobs", e))?;

        Ok(result.rows_affected())
    }
}
