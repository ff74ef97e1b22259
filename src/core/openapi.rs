use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::core::middleware::TRIGGER_SECRET_HEADER;
use crate::features::matching::{dtos as matching_dtos, handlers as matching_handlers};
use crate::features::matching::services::similarity::ScoreBreakdown;
use crate::features::reports::{dtos as reports_dtos, models as reports_models};
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        matching_handlers::report_created,
        matching_handlers::preview_candidates,
    ),
    components(
        schemas(
            Meta,
            reports_models::ReportType,
            reports_dtos::ReportCreatedDto,
            reports_dtos::ReportSummaryDto,
            ScoreBreakdown,
            matching_dtos::MatchStatusDto,
            matching_dtos::MatchOutcomeDto,
            matching_dtos::CandidatePreviewDto,
            ApiResponse<matching_dtos::MatchOutcomeDto>,
            ApiResponse<Vec<matching_dtos::CandidatePreviewDto>>,
        )
    ),
    tags(
        (name = "matching", description = "Lost/found report matching triggers and candidate previews"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Lost & Found Core API",
        version = "0.1.0",
        description = "Match detection service for lost and found reports",
    )
)]
pub struct ApiDoc;

/// Adds the trigger secret header scheme to the OpenAPI document
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "trigger_secret",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new(TRIGGER_SECRET_HEADER))),
            );
        }
    }
}

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}
