use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use utoipa::ToSchema;
use uuid::Uuid;

/// Which side of the marketplace a report belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "report_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ReportType {
    Lost,
    Found,
}

impl ReportType {
    /// The kind of report this one can be matched against
    pub fn opposite(self) -> Self {
        match self {
            ReportType::Lost => ReportType::Found,
            ReportType::Found => ReportType::Lost,
        }
    }
}

impl std::fmt::Display for ReportType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportType::Lost => write!(f, "lost"),
            ReportType::Found => write!(f, "found"),
        }
    }
}

/// Database model for a lost or found report
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Report {
    pub id: Uuid,
    pub report_type: ReportType,
    pub user_id: String,
    pub description: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub dominant_color_rgb: Option<Vec<i32>>,
    /// Milliseconds since epoch
    pub reported_at_ms: i64,
    pub match_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Report {
    pub fn is_matched(&self) -> bool {
        self.match_id.is_some()
    }

    /// Dominant color as an RGB triple, `None` if absent or malformed
    pub fn dominant_color(&self) -> Option<[u8; 3]> {
        self.dominant_color_rgb.as_deref().and_then(rgb_triple)
    }

    pub fn profile(&self) -> MatchProfile<'_> {
        MatchProfile {
            latitude: self.latitude,
            longitude: self.longitude,
            description: &self.description,
            color: self.dominant_color(),
            timestamp_ms: self.reported_at_ms,
        }
    }
}

/// A newly created report as delivered by a creation trigger.
///
/// `report_type` and `user_id` are optional here because trigger payloads
/// are not guaranteed to carry them; the matcher skips such reports.
#[derive(Debug, Clone, PartialEq)]
pub struct IncomingReport {
    pub id: Uuid,
    pub report_type: Option<ReportType>,
    pub user_id: Option<String>,
    pub description: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub dominant_color: Option<[u8; 3]>,
    pub timestamp_ms: i64,
    pub match_id: Option<Uuid>,
}

impl IncomingReport {
    /// Owning user id, `None` when absent or blank
    pub fn owner(&self) -> Option<&str> {
        self.user_id.as_deref().filter(|u| !u.trim().is_empty())
    }

    pub fn profile(&self) -> MatchProfile<'_> {
        MatchProfile {
            latitude: self.latitude,
            longitude: self.longitude,
            description: &self.description,
            color: self.dominant_color,
            timestamp_ms: self.timestamp_ms,
        }
    }
}

impl From<Report> for IncomingReport {
    fn from(report: Report) -> Self {
        let dominant_color = report.dominant_color();
        Self {
            id: report.id,
            report_type: Some(report.report_type),
            user_id: Some(report.user_id),
            description: report.description,
            latitude: report.latitude,
            longitude: report.longitude,
            dominant_color,
            timestamp_ms: report.reported_at_ms,
            match_id: report.match_id,
        }
    }
}

/// Converts a stored `[r, g, b]` array, rejecting wrong lengths and out-of-range channels
pub fn rgb_triple(values: &[i32]) -> Option<[u8; 3]> {
    match values {
        [r, g, b] => Some([
            u8::try_from(*r).ok()?,
            u8::try_from(*g).ok()?,
            u8::try_from(*b).ok()?,
        ]),
        _ => None,
    }
}

/// The features of a report that take part in similarity scoring
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchProfile<'a> {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub description: &'a str,
    pub color: Option<[u8; 3]>,
    pub timestamp_ms: i64,
}

/// A conditional `match_id` write: applied only while the row is still unmatched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchIdUpdate {
    pub report_id: Uuid,
    pub match_id: Uuid,
}

/// Result of an all-or-nothing batch of `match_id` writes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOutcome {
    Committed,
    /// Nothing was written because this report was already matched
    Rejected { report_id: Uuid },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opposite_type() {
        assert_eq!(ReportType::Lost.opposite(), ReportType::Found);
        assert_eq!(ReportType::Found.opposite(), ReportType::Lost);
    }

    #[test]
    fn test_rgb_triple() {
        assert_eq!(rgb_triple(&[10, 20, 255]), Some([10, 20, 255]));
        assert_eq!(rgb_triple(&[10, 20]), None);
        assert_eq!(rgb_triple(&[10, 20, 256]), None);
        assert_eq!(rgb_triple(&[-1, 0, 0]), None);
    }

    #[test]
    fn test_report_type_serde() {
        let json = serde_json::to_string(&ReportType::Found).unwrap();
        assert_eq!(json, "\"found\"");
        let parsed: ReportType = serde_json::from_str("\"lost\"").unwrap();
        assert_eq!(parsed, ReportType::Lost);
    }
}
