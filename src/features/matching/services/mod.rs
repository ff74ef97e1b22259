mod match_job_service;
mod match_linker;
mod report_matcher;
pub mod similarity;

pub use match_job_service::{MatchJobQueue, MatchJobService};
pub use match_linker::{LinkOutcome, MatchLinker};
pub use report_matcher::{MatchOutcome, ReportMatcher, ScoredCandidate, SkipReason};
