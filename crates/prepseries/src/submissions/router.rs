use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;

use crate::catalog::{BuyerId, PaperCatalog, PaperId};
use crate::entitlement::{EnrollmentStore, EntitlementError};

use super::domain::AnswerSheetUpload;
use super::repository::{AnswerSheetStore, SubmissionStore};
use super::service::{EvaluationRequest, SubmissionError, SubmissionService};

/// Router builder exposing the answer-sheet lifecycle endpoints.
pub fn submission_router<P, E, S, F>(service: Arc<SubmissionService<P, E, S, F>>) -> Router
where
    P: PaperCatalog + 'static,
    E: EnrollmentStore + 'static,
    S: SubmissionStore + 'static,
    F: AnswerSheetStore + 'static,
{
    Router::new()
        .route(
            "/api/v1/buyers/:buyer/papers/:paper/suggested-answer",
            get(suggested_answer_handler::<P, E, S, F>),
        )
        .route(
            "/api/v1/buyers/:buyer/papers/:paper/submission",
            post(submit_handler::<P, E, S, F>).get(status_handler::<P, E, S, F>),
        )
        .route(
            "/api/v1/buyers/:buyer/papers/:paper/evaluation",
            post(evaluate_handler::<P, E, S, F>),
        )
        .route(
            "/api/v1/papers/:paper/statistics",
            get(statistics_handler::<P, E, S, F>),
        )
        .with_state(service)
}

pub(crate) async fn suggested_answer_handler<P, E, S, F>(
    State(service): State<Arc<SubmissionService<P, E, S, F>>>,
    Path((buyer, paper)): Path<(String, String)>,
) -> Response
where
    P: PaperCatalog + 'static,
    E: EnrollmentStore + 'static,
    S: SubmissionStore + 'static,
    F: AnswerSheetStore + 'static,
{
    match service.view_suggested_answer(&BuyerId(buyer), &PaperId(paper)) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn submit_handler<P, E, S, F>(
    State(service): State<Arc<SubmissionService<P, E, S, F>>>,
    Path((buyer, paper)): Path<(String, String)>,
    axum::Json(upload): axum::Json<AnswerSheetUpload>,
) -> Response
where
    P: PaperCatalog + 'static,
    E: EnrollmentStore + 'static,
    S: SubmissionStore + 'static,
    F: AnswerSheetStore + 'static,
{
    match service.submit(&BuyerId(buyer), &PaperId(paper), upload) {
        Ok(submission) => {
            (StatusCode::ACCEPTED, axum::Json(submission.status_view())).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn status_handler<P, E, S, F>(
    State(service): State<Arc<SubmissionService<P, E, S, F>>>,
    Path((buyer, paper)): Path<(String, String)>,
) -> Response
where
    P: PaperCatalog + 'static,
    E: EnrollmentStore + 'static,
    S: SubmissionStore + 'static,
    F: AnswerSheetStore + 'static,
{
    match service.status(&BuyerId(buyer), &PaperId(paper)) {
        Ok(submission) => (StatusCode::OK, axum::Json(submission.status_view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn evaluate_handler<P, E, S, F>(
    State(service): State<Arc<SubmissionService<P, E, S, F>>>,
    Path((buyer, paper)): Path<(String, String)>,
    axum::Json(request): axum::Json<EvaluationRequest>,
) -> Response
where
    P: PaperCatalog + 'static,
    E: EnrollmentStore + 'static,
    S: SubmissionStore + 'static,
    F: AnswerSheetStore + 'static,
{
    match service.evaluate(&BuyerId(buyer), &PaperId(paper), request) {
        Ok(submission) => (StatusCode::OK, axum::Json(submission.status_view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn statistics_handler<P, E, S, F>(
    State(service): State<Arc<SubmissionService<P, E, S, F>>>,
    Path(paper): Path<String>,
) -> Response
where
    P: PaperCatalog + 'static,
    E: EnrollmentStore + 'static,
    S: SubmissionStore + 'static,
    F: AnswerSheetStore + 'static,
{
    match service.paper_statistics(&PaperId(paper)) {
        Ok(statistics) => (StatusCode::OK, axum::Json(statistics)).into_response(),
        Err(error) => error_response(error),
    }
}

fn error_response(error: SubmissionError) -> Response {
    let status = match &error {
        SubmissionError::SubmissionLocked
        | SubmissionError::AlreadySubmitted
        | SubmissionError::NotYetSubmitted
        | SubmissionError::AlreadyEvaluated => StatusCode::CONFLICT,
        SubmissionError::Entitlement(EntitlementError::Denied { .. })
        | SubmissionError::Entitlement(EntitlementError::NotEnrolled(_)) => StatusCode::FORBIDDEN,
        SubmissionError::PaperNotFound(_) | SubmissionError::SuggestedAnswerMissing(_) => {
            StatusCode::NOT_FOUND
        }
        SubmissionError::NotAQuestionPaper(_)
        | SubmissionError::InvalidMarks { .. }
        | SubmissionError::Entitlement(EntitlementError::MalformedKey(_)) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        SubmissionError::Catalog(_)
        | SubmissionError::Store(_)
        | SubmissionError::Enrollments(_)
        | SubmissionError::Files(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let payload = json!({ "error": error.to_string() });
    (status, axum::Json(payload)).into_response()
}
