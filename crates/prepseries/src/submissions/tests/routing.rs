use axum::http::StatusCode;
use tower::ServiceExt;

use super::common::*;
use crate::submissions::router::submission_router;
use crate::submissions::service::EvaluationRequest;

fn post_json(uri: &str, payload: &impl serde::Serialize) -> axum::http::Request<axum::body::Body> {
    axum::http::Request::post(uri)
        .header(axum::http::header::CONTENT_TYPE, "application/json")
        .body(axum::body::Body::from(
            serde_json::to_vec(payload).expect("payload serializes"),
        ))
        .expect("request builds")
}

fn get(uri: &str) -> axum::http::Request<axum::body::Body> {
    axum::http::Request::get(uri)
        .body(axum::body::Body::empty())
        .expect("request builds")
}

#[tokio::test]
async fn submit_route_accepts_answer_sheets() {
    let (service, _, _) = build_service();
    let router = submission_router(service);

    let response = router
        .oneshot(post_json(
            "/api/v1/buyers/buyer-1/papers/q-fr-s1/submission",
            &upload("attempt.pdf"),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let payload = read_json_body(response).await;
    assert_eq!(payload["status"], "submitted");
    assert_eq!(payload["submission_locked"], false);
}

#[tokio::test]
async fn suggested_answer_route_returns_the_artifact_url() {
    let (service, _, _) = build_service();
    let router = submission_router(service);

    let response = router
        .clone()
        .oneshot(get(
            "/api/v1/buyers/buyer-1/papers/q-fr-s1/suggested-answer",
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert!(payload["url"].as_str().expect("url present").contains("sa-fr-s1"));
    assert_eq!(payload["submission_locked"], true);

    // The lock now blocks the submit route with a conflict.
    let response = router
        .oneshot(post_json(
            "/api/v1/buyers/buyer-1/papers/q-fr-s1/submission",
            &upload("attempt.pdf"),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let payload = read_json_body(response).await;
    assert!(payload["error"]
        .as_str()
        .expect("error message")
        .contains("locked"));
}

#[tokio::test]
async fn evaluation_route_rejects_unsubmitted_papers() {
    let (service, _, _) = build_service();
    let router = submission_router(service);

    let request = EvaluationRequest {
        marks_obtained: 70,
        max_marks: 100,
        comments: "n/a".to_string(),
        evaluated_sheet: upload("evaluated.pdf"),
        evaluated_on: None,
    };
    let response = router
        .oneshot(post_json(
            "/api/v1/buyers/buyer-1/papers/q-fr-s1/evaluation",
            &request,
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn entitlement_violations_map_to_forbidden() {
    let (service, _, _) = build_service();
    let router = submission_router(service);

    let response = router
        .oneshot(post_json(
            "/api/v1/buyers/buyer-1/papers/q-fr-s2/submission",
            &upload("attempt.pdf"),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn statistics_route_serves_the_degenerate_case() {
    let (service, _, _) = build_service();
    let router = submission_router(service);

    let response = router
        .oneshot(get("/api/v1/papers/q-fr-s1/statistics"))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["highest_score"], 0);
    assert_eq!(payload["average_score"], 0.0);
    assert_eq!(payload["submission_count"], 0);
}

#[tokio::test]
async fn unknown_papers_map_to_not_found() {
    let (service, _, _) = build_service();
    let router = submission_router(service);

    let response = router
        .oneshot(get("/api/v1/papers/ghost/statistics"))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
