use std::sync::Arc;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};

use crate::core::middleware::trigger_secret_middleware;
use crate::features::matching::handlers::{self, MatchingState};
use crate::features::matching::services::ReportMatcher;

/// Create routes for the matching feature
///
/// Every route requires the shared trigger secret when one is configured;
/// the candidate preview exposes other users' reports.
pub fn routes(matcher: Arc<ReportMatcher>, trigger_secret: Option<String>) -> Router {
    let state = MatchingState { matcher };

    Router::new()
        .route(
            "/api/triggers/report-created",
            post(handlers::report_created),
        )
        .route(
            "/api/reports/{id}/candidates",
            get(handlers::preview_candidates),
        )
        .route_layer(from_fn_with_state(
            Arc::new(trigger_secret),
            trigger_secret_middleware,
        ))
        .with_state(state)
}
