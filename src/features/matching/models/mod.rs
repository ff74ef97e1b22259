mod match_job;

pub use match_job::{MatchJob, MatchJobStatus};
