mod report;

pub use report::{
    rgb_triple, BatchOutcome, IncomingReport, MatchIdUpdate, MatchProfile, Report, ReportType,
};
