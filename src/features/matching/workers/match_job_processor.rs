use std::sync::Arc;

use tokio::time::interval;

use crate::core::config::MatchWorkerConfig;
use crate::core::error::{AppError, Result};
use crate::features::matching::models::MatchJob;
use crate::features::matching::services::{MatchJobQueue, MatchOutcome, ReportMatcher};
use crate::features::reports::models::IncomingReport;
use crate::features::reports::ReportStore;

/// Background worker that runs one matching attempt per queued report-created event
pub struct MatchJobProcessor {
    config: MatchWorkerConfig,
    queue: Arc<dyn MatchJobQueue>,
    report_store: Arc<dyn ReportStore>,
    matcher: Arc<ReportMatcher>,
}

impl MatchJobProcessor {
    pub fn new(
        config: MatchWorkerConfig,
        queue: Arc<dyn MatchJobQueue>,
        report_store: Arc<dyn ReportStore>,
        matcher: Arc<ReportMatcher>,
    ) -> Self {
        Self {
            config,
            queue,
            report_store,
            matcher,
        }
    }

    /// Run the processor in a background loop
    pub async fn run(&self) {
        tracing::info!(
            "Starting match job processor (interval={:?}, batch_size={}, max_retries={})",
            self.config.interval,
            self.config.batch_size,
            self.config.max_retries
        );

        let mut ticker = interval(self.config.interval);

        loop {
            ticker.tick().await;

            if let Err(e) = self.process_batch().await {
                tracing::error!("Error processing match job batch: {:?}", e);
            }
        }
    }

    /// Process one batch of pending jobs; returns how many were attempted
    pub async fn process_batch(&self) -> Result<usize> {
        let jobs = self
            .queue
            .fetch_pending(
                self.config.max_retries,
                self.config.batch_size,
                self.config.processing_timeout,
            )
            .await?;

        if jobs.is_empty() {
            return Ok(0);
        }

        tracing::info!("Processing {} pending match jobs", jobs.len());

        for job in &jobs {
            if let Err(e) = self.process_job(job).await {
                tracing::error!(
                    "Match job {} for report {} failed: {}",
                    job.id,
                    job.report_id,
                    e
                );
                self.queue
                    .mark_failed(job, self.config.max_retries, &e.to_string())
                    .await?;
            }
        }

        Ok(jobs.len())
    }

    async fn process_job(&self, job: &MatchJob) -> Result<()> {
        self.queue.mark_processing(job.id).await?;

        // Re-read so a redelivered event sees the current match state
        let report = self
            .report_store
            .get_by_id(job.report_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Report {} not found", job.report_id)))?;

        let outcome = self
            .matcher
            .process_new_report(&IncomingReport::from(report))
            .await?;

        match outcome {
            MatchOutcome::Matched {
                lost_report_id,
                found_report_id,
                score,
                ..
            } => tracing::info!(
                "Match job {} linked lost={} found={} (score={:.3})",
                job.id,
                lost_report_id,
                found_report_id,
                score
            ),
            MatchOutcome::NoMatch { best_score, .. } => tracing::info!(
                "Match job {} found no match for report {} (best={:?})",
                job.id,
                job.report_id,
                best_score
            ),
            MatchOutcome::Skipped(reason) => tracing::info!(
                "Match job {} skipped report {}: {:?}",
                job.id,
                job.report_id,
                reason
            ),
        }

        self.queue.mark_completed(job.id).await
    }
}
