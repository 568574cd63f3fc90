use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use prepseries::catalog::{CatalogStore, PaperCatalog};
use prepseries::entitlement::EnrollmentStore;
use prepseries::pricing::DiscountResolver;
use prepseries::storefront::{storefront_router, StorefrontService};
use prepseries::submissions::{
    submission_router, AnswerSheetStore, SubmissionService, SubmissionStore,
};
use serde_json::json;
use std::sync::Arc;

/// Merge the two area routers with the operational endpoints. Route paths
/// live with their routers in the library crate; this layer only composes.
pub(crate) fn with_storefront_routes<C, D, P, E, S, F>(
    storefront: Arc<StorefrontService<C, D, P, E>>,
    submissions: Arc<SubmissionService<P, E, S, F>>,
) -> axum::Router
where
    C: CatalogStore + 'static,
    D: DiscountResolver + 'static,
    P: PaperCatalog + 'static,
    E: EnrollmentStore + 'static,
    S: SubmissionStore + 'static,
    F: AnswerSheetStore + 'static,
{
    storefront_router(storefront)
        .merge(submission_router(submissions))
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
