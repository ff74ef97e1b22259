mod match_dto;

pub use match_dto::{CandidatePreviewDto, MatchOutcomeDto, MatchStatusDto};
