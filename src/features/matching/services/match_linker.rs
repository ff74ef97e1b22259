use std::sync::Arc;

use uuid::Uuid;

use crate::core::error::Result;
use crate::features::reports::models::{BatchOutcome, MatchIdUpdate};
use crate::features::reports::ReportStore;

/// Outcome of an attempt to pair two reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOutcome {
    /// Both reports now point at each other
    Linked,
    /// The triggering report was claimed by another match in the meantime
    SourceClaimed,
    /// The candidate was claimed by another match in the meantime
    CandidateClaimed,
}

/// Commits bidirectional `match_id` links in a single atomic batch
pub struct MatchLinker {
    report_store: Arc<dyn ReportStore>,
}

impl MatchLinker {
    pub fn new(report_store: Arc<dyn ReportStore>) -> Self {
        Self { report_store }
    }

    /// Set `source.match_id = candidate` and `candidate.match_id = source` together.
    ///
    /// Neither row is touched unless both are still unmatched.
    pub async fn link(&self, source_id: Uuid, candidate_id: Uuid) -> Result<LinkOutcome> {
        let updates = [
            MatchIdUpdate {
                report_id: source_id,
                match_id: candidate_id,
            },
            MatchIdUpdate {
                report_id: candidate_id,
                match_id: source_id,
            },
        ];

        let outcome = match self.report_store.apply_match_updates(&updates).await? {
            BatchOutcome::Committed => LinkOutcome::Linked,
            BatchOutcome::Rejected { report_id } if report_id == source_id => {
                LinkOutcome::SourceClaimed
            }
            BatchOutcome::Rejected { .. } => LinkOutcome::CandidateClaimed,
        };

        match outcome {
            LinkOutcome::Linked => {
                tracing::info!("Linked report {} <-> {}", source_id, candidate_id)
            }
            LinkOutcome::SourceClaimed => tracing::warn!(
                "Report {} was matched concurrently; link to {} abandoned",
                source_id,
                candidate_id
            ),
            LinkOutcome::CandidateClaimed => tracing::warn!(
                "Candidate {} was matched concurrently; link from {} abandoned",
                candidate_id,
                source_id
            ),
        }

        Ok(outcome)
    }
}
