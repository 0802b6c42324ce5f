//! SQLite Job Store

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::FromRow;
use std::time::Duration;

use super::DbPool;
use crate::application::ports::{sweep_cutoff, JobStorePort, StoreError};
use crate::domain::job::{Job, JobError, JobId, JobInput, JobPatch, JobStatus};

/// SQLite Job Store
///
/// 记录跨进程重启保留；merge 在事务内读-改-写
pub struct SqliteJobStore {
    pool: DbPool,
}

impl SqliteJobStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct JobRow {
    id: String,
    status: String,
    input: String,
    provider: String,
    result: Option<String>,
    error: Option<String>,
    created_at: String,
    completed_at: Option<String>,
}

impl TryFrom<JobRow> for Job {
    type Error = StoreError;

    fn try_from(row: JobRow) -> Result<Self, Self::Error> {
        let status: JobStatus = row
            .status
            .parse()
            .map_err(|e: JobError| StoreError::Backend(e.to_string()))?;
        let input: JobInput = serde_json::from_str(&row.input)
            .map_err(|e| StoreError::Backend(format!("corrupt job input: {}", e)))?;
        let completed_at = row.completed_at.as_deref().map(parse_timestamp).transpose()?;

        Ok(Job::restore(
            JobId::from_string(row.id),
            status,
            input,
            row.provider,
            row.result,
            row.error,
            parse_timestamp(&row.created_at)?,
            completed_at,
        ))
    }
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StoreError::Backend(format!("invalid timestamp {}: {}", value, e)))
}

/// 定宽格式，保证字符串比较与时间先后一致
fn format_timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn backend(e: sqlx::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

const SELECT_JOB: &str = "SELECT id, status, input, provider, result, error, created_at, completed_at FROM jobs WHERE id = ?";

#[async_trait]
impl JobStorePort for SqliteJobStore {
    async fn create(&self, job: Job) -> Result<(), StoreError> {
        let input = serde_json::to_string(job.input())
            .map_err(|e| StoreError::Backend(format!("failed to encode job input: {}", e)))?;

        sqlx::query(
            r#"
            INSERT INTO jobs (id, status, input, provider, result, error, created_at, completed_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(job.id().as_str())
        .bind(job.status().as_str())
        .bind(input)
        .bind(job.provider())
        .bind(job.result())
        .bind(job.error())
        .bind(format_timestamp(job.created_at()))
        .bind(job.completed_at().map(format_timestamp))
        .execute(&self.pool)
        .await
        .map_err(|e| {
            let duplicate = e
                .as_database_error()
                .map(|db| db.is_unique_violation())
                .unwrap_or(false);
            if duplicate {
                StoreError::DuplicateId(job.id().to_string())
            } else {
                backend(e)
            }
        })?;

        tracing::debug!(job_id = %job.id(), provider = %job.provider(), "Job stored");
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Job, StoreError> {
        let row: Option<JobRow> = sqlx::query_as(SELECT_JOB)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;

        row.ok_or_else(|| StoreError::NotFound(id.to_string()))?
            .try_into()
    }

    async fn merge(&self, id: &str, patch: JobPatch) -> Result<Job, StoreError> {
        let mut tx = self.pool.begin().await.map_err(backend)?;

        let row: Option<JobRow> = sqlx::query_as(SELECT_JOB)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(backend)?;
        let mut job: Job = row
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?
            .try_into()?;

        job.apply(patch)?;

        // 只更新仍处于 processing 的记录
        let updated = sqlx::query(
            r#"
            UPDATE jobs SET status = ?, provider = ?, result = ?, error = ?, completed_at = ?
            WHERE id = ? AND status = 'processing'
            "#,
        )
        .bind(job.status().as_str())
        .bind(job.provider())
        .bind(job.result())
        .bind(job.error())
        .bind(job.completed_at().map(format_timestamp))
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(backend)?;

        if updated.rows_affected() == 0 {
            return Err(StoreError::InvalidTransition(format!(
                "job {} is no longer processing",
                id
            )));
        }

        tx.commit().await.map_err(backend)?;

        tracing::debug!(job_id = %id, status = %job.status().as_str(), "Job merged");
        Ok(job)
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let deleted = sqlx::query("DELETE FROM jobs WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(backend)?;

        if deleted.rows_affected() == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn sweep_older_than(
        &self,
        older_than: Duration,
        statuses: &[JobStatus],
    ) -> Result<usize, StoreError> {
        let statuses: Vec<_> = statuses.iter().filter(|s| s.is_terminal()).collect();
        if statuses.is_empty() {
            return Ok(0);
        }
        let cutoff = format_timestamp(sweep_cutoff(older_than)?);

        let placeholders = vec!["?"; statuses.len()].join(", ");
        let sql = format!(
            "DELETE FROM jobs WHERE completed_at IS NOT NULL AND completed_at < ? AND status IN ({})",
            placeholders
        );
        let mut query = sqlx::query(&sql).bind(cutoff);
        for status in statuses {
            query = query.bind(status.as_str());
        }

        let removed = query
            .execute(&self.pool)
            .await
            .map_err(backend)?
            .rows_affected() as usize;

        if removed > 0 {
            tracing::debug!(removed, "Expired jobs removed");
        }
        Ok(removed)
    }

    fn backend_name(&self) -> &'static str {
        "sqlite"
    }
}
