mod match_job_processor;

pub use match_job_processor::MatchJobProcessor;
