use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::features::matching::services::similarity::ScoreBreakdown;
use crate::features::matching::services::{MatchOutcome, ScoredCandidate, SkipReason};
use crate::features::notifications::services::DispatchOutcome;
use crate::features::reports::dtos::ReportSummaryDto;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatusDto {
    Matched,
    NoMatch,
    Skipped,
}

/// Result of handling one report-created event
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MatchOutcomeDto {
    pub status: MatchStatusDto,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lost_report_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub found_report_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidates_scored: Option<usize>,
    pub notified: bool,
}

impl From<MatchOutcome> for MatchOutcomeDto {
    fn from(outcome: MatchOutcome) -> Self {
        let empty = Self {
            status: MatchStatusDto::Skipped,
            skip_reason: None,
            lost_report_id: None,
            found_report_id: None,
            score: None,
            candidates_scored: None,
            notified: false,
        };

        match outcome {
            MatchOutcome::Skipped(reason) => Self {
                skip_reason: Some(
                    match reason {
                        SkipReason::MissingType => "missing_type",
                        SkipReason::MissingUserId => "missing_user_id",
                        SkipReason::AlreadyMatched => "already_matched",
                    }
                    .to_string(),
                ),
                ..empty
            },
            MatchOutcome::NoMatch {
                candidates_scored,
                best_score,
            } => Self {
                status: MatchStatusDto::NoMatch,
                score: best_score,
                candidates_scored: Some(candidates_scored),
                ..empty
            },
            MatchOutcome::Matched {
                lost_report_id,
                found_report_id,
                score,
                notification,
            } => Self {
                status: MatchStatusDto::Matched,
                lost_report_id: Some(lost_report_id),
                found_report_id: Some(found_report_id),
                score: Some(score),
                notified: notification == DispatchOutcome::Sent,
                ..empty
            },
        }
    }
}

/// One ranked candidate with its per-signal scores
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CandidatePreviewDto {
    pub report: ReportSummaryDto,
    pub score: ScoreBreakdown,
    pub accepted: bool,
}

impl From<&ScoredCandidate> for CandidatePreviewDto {
    fn from(candidate: &ScoredCandidate) -> Self {
        Self {
            report: ReportSummaryDto::from(&candidate.report),
            score: candidate.score,
            accepted: candidate.score.is_match(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_matched_outcome_serialization() {
        let lost = Uuid::new_v4();
        let found = Uuid::new_v4();
        let dto = MatchOutcomeDto::from(MatchOutcome::Matched {
            lost_report_id: lost,
            found_report_id: found,
            score: 0.9,
            notification: DispatchOutcome::NoToken,
        });

        let value = serde_json::to_value(&dto).unwrap();
        assert_eq!(value["status"], json!("matched"));
        assert_eq!(value["lostReportId"], json!(lost.to_string()));
        assert_eq!(value["foundReportId"], json!(found.to_string()));
        assert_eq!(value["notified"], json!(false));
        assert!(value.get("skipReason").is_none());
    }

    #[test]
    fn test_suppressed_notification_is_not_notified() {
        let dto = MatchOutcomeDto::from(MatchOutcome::Matched {
            lost_report_id: Uuid::new_v4(),
            found_report_id: Uuid::new_v4(),
            score: 0.9,
            notification: DispatchOutcome::Suppressed,
        });
        assert_eq!(dto.status, MatchStatusDto::Matched);
        assert!(!dto.notified);
    }

    #[test]
    fn test_skipped_outcome_carries_reason() {
        let dto = MatchOutcomeDto::from(MatchOutcome::Skipped(SkipReason::AlreadyMatched));
        assert_eq!(dto.status, MatchStatusDto::Skipped);
        assert_eq!(dto.skip_reason.as_deref(), Some("already_matched"));
        assert!(dto.score.is_none());
    }

    #[test]
    fn test_no_match_reports_best_score() {
        let dto = MatchOutcomeDto::from(MatchOutcome::NoMatch {
            candidates_scored: 0,
            best_score: None,
        });
        assert_eq!(dto.status, MatchStatusDto::NoMatch);
        assert_eq!(dto.candidates_scored, Some(0));
        assert!(dto.score.is_none());
    }
}
