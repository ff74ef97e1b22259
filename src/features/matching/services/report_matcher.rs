use std::cmp::Ordering;
use std::sync::Arc;

use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::matching::services::similarity::{score_pair, ScoreBreakdown};
use crate::features::matching::services::{LinkOutcome, MatchLinker};
use crate::features::notifications::services::{DispatchOutcome, NotificationDispatcher};
use crate::features::reports::models::{IncomingReport, Report, ReportType};
use crate::features::reports::ReportStore;

/// A candidate report with its similarity to the triggering report
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    pub report: Report,
    pub score: ScoreBreakdown,
}

/// Why a matching attempt did not run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    MissingType,
    MissingUserId,
    AlreadyMatched,
}

/// Result of one matching attempt
#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    Skipped(SkipReason),
    NoMatch {
        candidates_scored: usize,
        best_score: Option<f64>,
    },
    Matched {
        lost_report_id: Uuid,
        found_report_id: Uuid,
        score: f64,
        notification: DispatchOutcome,
    },
}

/// Runs one matching attempt per newly created report
pub struct ReportMatcher {
    report_store: Arc<dyn ReportStore>,
    linker: MatchLinker,
    dispatcher: Arc<NotificationDispatcher>,
}

impl ReportMatcher {
    pub fn new(report_store: Arc<dyn ReportStore>, dispatcher: Arc<NotificationDispatcher>) -> Self {
        Self {
            linker: MatchLinker::new(Arc::clone(&report_store)),
            report_store,
            dispatcher,
        }
    }

    /// Match a newly created report against unmatched reports of the opposite type.
    ///
    /// The best candidate scoring at least the threshold is linked. If it was
    /// claimed by a concurrent match, the next accepted candidate is tried.
    pub async fn process_new_report(&self, report: &IncomingReport) -> Result<MatchOutcome> {
        let Some(report_type) = report.report_type else {
            tracing::warn!("Report {} has no type, skipping match", report.id);
            return Ok(MatchOutcome::Skipped(SkipReason::MissingType));
        };
        let Some(user_id) = report.owner() else {
            tracing::warn!("Report {} has no owner, skipping match", report.id);
            return Ok(MatchOutcome::Skipped(SkipReason::MissingUserId));
        };
        if let Some(match_id) = report.match_id {
            tracing::info!(
                "Report {} already matched to {}, skipping",
                report.id,
                match_id
            );
            return Ok(MatchOutcome::Skipped(SkipReason::AlreadyMatched));
        }

        let ranked = self.rank_candidates(report, report_type, user_id).await?;
        let best_score = ranked.first().map(|c| c.score.total);

        tracing::info!(
            "Scored {} {} candidates for {} report {} (best={:?})",
            ranked.len(),
            report_type.opposite(),
            report_type,
            report.id,
            best_score
        );

        for candidate in ranked.iter().take_while(|c| c.score.is_match()) {
            match self.linker.link(report.id, candidate.report.id).await? {
                LinkOutcome::Linked => {
                    return self
                        .notify_owner(report_type, user_id, report.id, candidate)
                        .await;
                }
                LinkOutcome::CandidateClaimed => continue,
                LinkOutcome::SourceClaimed => {
                    return Ok(MatchOutcome::Skipped(SkipReason::AlreadyMatched));
                }
            }
        }

        Ok(MatchOutcome::NoMatch {
            candidates_scored: ranked.len(),
            best_score,
        })
    }

    /// Eligible candidates for a stored report, best first, without linking anything
    pub async fn preview_candidates(&self, report_id: Uuid) -> Result<Vec<ScoredCandidate>> {
        let report = self
            .report_store
            .get_by_id(report_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Report {} not found", report_id)))?;

        let incoming = IncomingReport::from(report);
        let (report_type, user_id) = match (incoming.report_type, incoming.owner()) {
            (Some(t), Some(u)) => (t, u),
            _ => return Ok(Vec::new()),
        };

        self.rank_candidates(&incoming, report_type, user_id).await
    }

    /// Score every unmatched, other-owner report of the opposite type.
    ///
    /// The sort is stable, so on equal scores the earlier candidate stays ahead.
    async fn rank_candidates(
        &self,
        report: &IncomingReport,
        report_type: ReportType,
        user_id: &str,
    ) -> Result<Vec<ScoredCandidate>> {
        let pool = self
            .report_store
            .find_by_type(report_type.opposite())
            .await
            .map_err(|e| {
                tracing::error!("Failed to load candidates for report {}: {}", report.id, e);
                e
            })?;

        let profile = report.profile();
        let mut ranked: Vec<ScoredCandidate> = pool
            .into_iter()
            .filter(|c| !c.is_matched() && c.user_id != user_id)
            .map(|candidate| ScoredCandidate {
                score: score_pair(&profile, &candidate.profile()),
                report: candidate,
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.score
                .total
                .partial_cmp(&a.score.total)
                .unwrap_or(Ordering::Equal)
        });

        Ok(ranked)
    }

    /// Notify the owner of the lost side; the link stands even if this fails
    async fn notify_owner(
        &self,
        report_type: ReportType,
        user_id: &str,
        report_id: Uuid,
        candidate: &ScoredCandidate,
    ) -> Result<MatchOutcome> {
        let (lost_report_id, found_report_id, owner) = match report_type {
            ReportType::Lost => (report_id, candidate.report.id, user_id),
            ReportType::Found => (
                candidate.report.id,
                report_id,
                candidate.report.user_id.as_str(),
            ),
        };

        tracing::info!(
            "Match recorded: lost={} found={} score={:.3}",
            lost_report_id,
            found_report_id,
            candidate.score.total
        );

        let notification = self
            .dispatcher
            .notify_match(owner, lost_report_id, found_report_id)
            .await
            .map_err(|e| {
                tracing::error!(
                    "Match {} <-> {} is committed but notification failed: {}",
                    lost_report_id,
                    found_report_id,
                    e
                );
                e
            })?;

        Ok(MatchOutcome::Matched {
            lost_report_id,
            found_report_id,
            score: candidate.score.total,
            notification,
        })
    }
}
