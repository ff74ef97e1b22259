pub mod matching;
pub mod notifications;
pub mod reports;
