use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

/// Match job status enum matching database enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "match_job_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MatchJobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl std::fmt::Display for MatchJobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchJobStatus::Pending => write!(f, "pending"),
            MatchJobStatus::Processing => write!(f, "processing"),
            MatchJobStatus::Completed => write!(f, "completed"),
            MatchJobStatus::Failed => write!(f, "failed"),
        }
    }
}

/// One report-created event waiting for a matching attempt
#[derive(Debug, Clone, FromRow)]
pub struct MatchJob {
    pub id: Uuid,
    pub report_id: Uuid,
    pub status: MatchJobStatus,
    pub retry_count: i32,
    pub error_message: Option<String>,
    pub enqueued_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
    pub last_attempt_at: Option<DateTime<Utc>>,
}

impl MatchJob {
    /// Status after a failed attempt: back to pending until retries run out
    pub fn status_after_failure(&self, max_retries: i32) -> MatchJobStatus {
        if self.retry_count + 1 >= max_retries {
            MatchJobStatus::Failed
        } else {
            MatchJobStatus::Pending
        }
    }
}
