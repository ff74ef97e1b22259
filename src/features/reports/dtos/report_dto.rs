use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::features::reports::models::{rgb_triple, IncomingReport, Report, ReportType};

/// Report payload delivered by the creation trigger
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportCreatedDto {
    /// Identifier assigned by the store at creation
    pub id: Uuid,
    #[serde(rename = "type")]
    pub report_type: Option<ReportType>,
    #[validate(length(max = 128, message = "userId must not exceed 128 characters"))]
    pub user_id: Option<String>,
    #[serde(default)]
    #[validate(length(max = 5000, message = "Description must not exceed 5000 characters"))]
    pub description: Option<String>,
    #[validate(range(min = -90.0, max = 90.0, message = "Latitude must be between -90 and 90"))]
    pub latitude: Option<f64>,
    #[validate(range(
        min = -180.0,
        max = 180.0,
        message = "Longitude must be between -180 and 180"
    ))]
    pub longitude: Option<f64>,
    #[validate(custom(function = "validate_rgb"))]
    pub dominant_color_rgb: Option<Vec<i32>>,
    /// Creation time in milliseconds since epoch; defaults to now
    pub timestamp: Option<i64>,
    pub match_id: Option<Uuid>,
}

fn validate_rgb(values: &Vec<i32>) -> Result<(), ValidationError> {
    if rgb_triple(values).is_none() {
        let mut error = ValidationError::new("rgb");
        error.message = Some("dominantColorRgb must be three integers in [0, 255]".into());
        return Err(error);
    }
    Ok(())
}

impl From<ReportCreatedDto> for IncomingReport {
    fn from(dto: ReportCreatedDto) -> Self {
        Self {
            id: dto.id,
            report_type: dto.report_type,
            user_id: dto.user_id,
            description: dto.description.unwrap_or_default(),
            latitude: dto.latitude,
            longitude: dto.longitude,
            dominant_color: dto.dominant_color_rgb.as_deref().and_then(rgb_triple),
            timestamp_ms: dto
                .timestamp
                .unwrap_or_else(|| Utc::now().timestamp_millis()),
            match_id: dto.match_id,
        }
    }
}

/// Compact view of a stored report
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummaryDto {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub report_type: ReportType,
    pub user_id: String,
    pub description: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub dominant_color_rgb: Option<Vec<i32>>,
    pub timestamp: i64,
    pub match_id: Option<Uuid>,
}

impl From<&Report> for ReportSummaryDto {
    fn from(r: &Report) -> Self {
        Self {
            id: r.id,
            report_type: r.report_type,
            user_id: r.user_id.clone(),
            description: r.description.clone(),
            latitude: r.latitude,
            longitude: r.longitude,
            dominant_color_rgb: r.dominant_color_rgb.clone(),
            timestamp: r.reported_at_ms,
            match_id: r.match_id,
        }
    }
}
