use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::matching::models::{MatchJob, MatchJobStatus};

/// Queue of report-created events awaiting a matching attempt
#[async_trait]
pub trait MatchJobQueue: Send + Sync {
    /// Pending jobs, plus jobs stuck in `processing` for longer than `stale_after`
    async fn fetch_pending(
        &self,
        max_retries: i32,
        batch_size: i64,
        stale_after: Duration,
    ) -> Result<Vec<MatchJob>>;

    async fn mark_processing(&self, job_id: Uuid) -> Result<()>;

    async fn mark_completed(&self, job_id: Uuid) -> Result<()>;

    /// Record a failed attempt; the job returns to pending until retries run out
    async fn mark_failed(&self, job: &MatchJob, max_retries: i32, error_message: &str)
        -> Result<()>;
}

/// PostgreSQL-backed match job queue, fed by the `reports` insert trigger
pub struct MatchJobService {
    pool: PgPool,
}

impl MatchJobService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn set_status(&self, job_id: Uuid, status: MatchJobStatus) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE match_jobs
            SET status = $2,
                last_attempt_at = NOW(),
                processed_at = CASE WHEN $2 = 'completed'::match_job_status THEN NOW() ELSE processed_at END
            WHERE id = $1
            "#,
        )
        .bind(job_id)
        .bind(status)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to set match job {} to {}: {:?}", job_id, status, e);
            AppError::Database(e)
        })?;

        Ok(())
    }
}

#[async_trait]
impl MatchJobQueue for MatchJobService {
    async fn fetch_pending(
        &self,
        max_retries: i32,
        batch_size: i64,
        stale_after: Duration,
    ) -> Result<Vec<MatchJob>> {
        sqlx::query_as::<_, MatchJob>(
            r#"
            SELECT
                id, report_id, status, retry_count, error_message,
                enqueued_at, processed_at, last_attempt_at
            FROM match_jobs
            WHERE (
                status = 'pending'
                OR (
                    status = 'processing'
                    AND last_attempt_at < NOW() - make_interval(secs => $3)
                )
            )
            AND retry_count < $1
            ORDER BY enqueued_at ASC
            LIMIT $2
            "#,
        )
        .bind(max_retries)
        .bind(batch_size)
        .bind(stale_after.as_secs_f64())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch pending match jobs: {:?}", e);
            AppError::Database(e)
        })
    }

    async fn mark_processing(&self, job_id: Uuid) -> Result<()> {
        self.set_status(job_id, MatchJobStatus::Processing).await
    }

    async fn mark_completed(&self, job_id: Uuid) -> Result<()> {
        self.set_status(job_id, MatchJobStatus::Completed).await?;
        tracing::debug!("Match job {} marked as completed", job_id);
        Ok(())
    }

    async fn mark_failed(
        &self,
        job: &MatchJob,
        max_retries: i32,
        error_message: &str,
    ) -> Result<()> {
        let new_retry_count = job.retry_count + 1;
        let new_status = job.status_after_failure(max_retries);

        sqlx::query(
            r#"
            UPDATE match_jobs
            SET status = $2, error_message = $3, retry_count = $4, last_attempt_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(job.id)
        .bind(new_status)
        .bind(error_message)
        .bind(new_retry_count)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to mark match job as failed: {:?}", e);
            AppError::Database(e)
        })?;

        if new_status == MatchJobStatus::Failed {
            tracing::warn!(
                "Match job {} for report {} permanently failed after {} attempts",
                job.id,
                job.report_id,
                new_retry_count
            );
        } else {
            tracing::info!(
                "Match job {} marked for retry ({}/{})",
                job.id,
                new_retry_count,
                max_retries
            );
        }

        Ok(())
    }
}
