use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::matching::dtos::{CandidatePreviewDto, MatchOutcomeDto};
use crate::features::matching::services::ReportMatcher;
use crate::features::reports::dtos::ReportCreatedDto;
use crate::features::reports::models::IncomingReport;
use crate::shared::types::ApiResponse;

/// State for matching handlers
#[derive(Clone)]
pub struct MatchingState {
    pub matcher: Arc<ReportMatcher>,
}

/// Handle a report-created event and attempt a match
#[utoipa::path(
    post,
    path = "/api/triggers/report-created",
    request_body = ReportCreatedDto,
    responses(
        (status = 200, description = "Matching attempt finished", body = ApiResponse<MatchOutcomeDto>),
        (status = 400, description = "Invalid report payload"),
        (status = 401, description = "Missing or invalid trigger secret"),
        (status = 502, description = "Push gateway rejected the notification")
    ),
    security(("trigger_secret" = [])),
    tag = "matching"
)]
pub async fn report_created(
    State(state): State<MatchingState>,
    AppJson(dto): AppJson<ReportCreatedDto>,
) -> Result<Json<ApiResponse<MatchOutcomeDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let report = IncomingReport::from(dto);
    tracing::debug!("Report-created trigger for {}", report.id);

    let outcome = state.matcher.process_new_report(&report).await?;

    Ok(Json(ApiResponse::success(
        Some(MatchOutcomeDto::from(outcome)),
        None,
        None,
    )))
}

/// Rank candidate matches for a stored report without linking anything
#[utoipa::path(
    get,
    path = "/api/reports/{id}/candidates",
    params(
        ("id" = Uuid, Path, description = "Report ID")
    ),
    responses(
        (status = 200, description = "Ranked candidates, best first", body = ApiResponse<Vec<CandidatePreviewDto>>),
        (status = 401, description = "Missing or invalid trigger secret"),
        (status = 404, description = "Report not found")
    ),
    security(("trigger_secret" = [])),
    tag = "matching"
)]
pub async fn preview_candidates(
    State(state): State<MatchingState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<CandidatePreviewDto>>>> {
    let candidates = state.matcher.preview_candidates(id).await?;
    let dtos: Vec<CandidatePreviewDto> = candidates.iter().map(CandidatePreviewDto::from).collect();
    Ok(Json(ApiResponse::success(Some(dtos), None, None)))
}
