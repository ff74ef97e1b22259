use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::reports::models::{BatchOutcome, MatchIdUpdate, Report, ReportType};

/// Read/write contract the matcher needs from the report store
#[async_trait]
pub trait ReportStore: Send + Sync {
    /// All reports of the given type, matched or not
    async fn find_by_type(&self, report_type: ReportType) -> Result<Vec<Report>>;

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Report>>;

    /// Apply every update or none of them.
    ///
    /// Each update only lands on a row whose `match_id` is still null; if any
    /// row was already claimed the whole batch is rolled back.
    async fn apply_match_updates(&self, updates: &[MatchIdUpdate]) -> Result<BatchOutcome>;
}

/// PostgreSQL-backed report store
pub struct ReportService {
    pool: PgPool,
}

impl ReportService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReportStore for ReportService {
    async fn find_by_type(&self, report_type: ReportType) -> Result<Vec<Report>> {
        sqlx::query_as::<_, Report>(
            r#"
            SELECT
                id, report_type, user_id, description, latitude, longitude,
                dominant_color_rgb, reported_at_ms, match_id, created_at
            FROM reports
            WHERE report_type = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(report_type)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch {} reports: {:?}", report_type, e);
            AppError::Database(e)
        })
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Report>> {
        sqlx::query_as::<_, Report>(
            r#"
            SELECT
                id, report_type, user_id, description, latitude, longitude,
                dominant_color_rgb, reported_at_ms, match_id, created_at
            FROM reports
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to get report {}: {:?}", id, e);
            AppError::Database(e)
        })
    }

    async fn apply_match_updates(&self, updates: &[MatchIdUpdate]) -> Result<BatchOutcome> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            tracing::error!("Failed to begin match transaction: {:?}", e);
            AppError::Database(e)
        })?;

        for update in updates {
            let result = sqlx::query(
                r#"
                UPDATE reports
                SET match_id = $2, matched_at = NOW()
                WHERE id = $1 AND match_id IS NULL
                "#,
            )
            .bind(update.report_id)
            .bind(update.match_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                tracing::error!(
                    "Failed to set match_id on report {}: {:?}",
                    update.report_id,
                    e
                );
                AppError::Database(e)
            })?;

            if result.rows_affected() == 0 {
                tx.rollback().await.map_err(AppError::Database)?;
                return Ok(BatchOutcome::Rejected {
                    report_id: update.report_id,
                });
            }
        }

        tx.commit().await.map_err(|e| {
            tracing::error!("Failed to commit match transaction: {:?}", e);
            AppError::Database(e)
        })?;

        Ok(BatchOutcome::Committed)
    }
}
