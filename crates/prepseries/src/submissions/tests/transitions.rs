use std::sync::Arc;

use super::common::*;
use crate::entitlement::EntitlementError;
use crate::submissions::domain::SubmissionState;
use crate::submissions::service::{EvaluationRequest, SubmissionError, SubmissionService};

fn evaluation_request(marks: u16, max: u16) -> EvaluationRequest {
    EvaluationRequest {
        marks_obtained: marks,
        max_marks: max,
        comments: "good attempt, improve presentation".to_string(),
        evaluated_sheet: upload("evaluated.pdf"),
        evaluated_on: None,
    }
}

#[test]
fn viewing_the_suggested_answer_locks_submission() {
    let (service, _, _) = build_service();

    let view = service
        .view_suggested_answer(&buyer(), &paper_id("q-fr-s1"))
        .expect("view succeeds");
    assert!(view.submission_locked);
    assert!(view.url.contains("sa-fr-s1"));

    let error = service
        .submit(&buyer(), &paper_id("q-fr-s1"), upload("attempt.pdf"))
        .unwrap_err();
    assert!(matches!(error, SubmissionError::SubmissionLocked));
}

#[test]
fn viewing_after_submission_carries_no_penalty() {
    let (service, submissions, _) = build_service();

    let submitted = service
        .submit(&buyer(), &paper_id("q-fr-s1"), upload("attempt.pdf"))
        .expect("first submit succeeds");
    assert_eq!(submitted.state, SubmissionState::Submitted);
    assert!(submitted.answer_sheet.is_some());

    let view = service
        .view_suggested_answer(&buyer(), &paper_id("q-fr-s1"))
        .expect("post-submit view succeeds");
    assert!(!view.submission_locked);

    // The second submit fails because one already exists, not because of
    // the fairness lock.
    let error = service
        .submit(&buyer(), &paper_id("q-fr-s1"), upload("retry.pdf"))
        .unwrap_err();
    assert!(matches!(error, SubmissionError::AlreadySubmitted));

    let stored = submissions.stored(BUYER, "q-fr-s1").expect("record exists");
    assert_eq!(stored.state, SubmissionState::Submitted);
    assert!(!stored.locked());
}

#[test]
fn the_viewed_flag_is_never_cleared() {
    let (service, submissions, _) = build_service();

    service
        .view_suggested_answer(&buyer(), &paper_id("q-fr-s1"))
        .expect("first view");
    service
        .view_suggested_answer(&buyer(), &paper_id("q-fr-s1"))
        .expect("second view");

    let stored = submissions.stored(BUYER, "q-fr-s1").expect("record exists");
    assert!(stored.suggested_answer_viewed);
    assert_eq!(stored.state, SubmissionState::Unsubmitted);
}

#[test]
fn evaluation_requires_a_submission() {
    let (service, _, _) = build_service();

    let error = service
        .evaluate(&buyer(), &paper_id("q-fr-s1"), evaluation_request(70, 100))
        .unwrap_err();
    assert!(matches!(error, SubmissionError::NotYetSubmitted));
}

#[test]
fn evaluation_is_terminal() {
    let (service, _, _) = build_service();

    service
        .submit(&buyer(), &paper_id("q-fr-s1"), upload("attempt.pdf"))
        .expect("submit succeeds");
    let evaluated = service
        .evaluate(&buyer(), &paper_id("q-fr-s1"), evaluation_request(70, 100))
        .expect("evaluation succeeds");
    assert_eq!(evaluated.state, SubmissionState::Evaluated);
    let evaluation = evaluated.evaluation.expect("verdict recorded");
    assert_eq!(evaluation.marks_obtained, 70);
    assert_eq!(evaluation.max_marks, 100);

    let error = service
        .evaluate(&buyer(), &paper_id("q-fr-s1"), evaluation_request(80, 100))
        .unwrap_err();
    assert!(matches!(error, SubmissionError::AlreadyEvaluated));
}

#[test]
fn marks_above_maximum_are_rejected() {
    let (service, _, _) = build_service();

    service
        .submit(&buyer(), &paper_id("q-fr-s1"), upload("attempt.pdf"))
        .expect("submit succeeds");
    let error = service
        .evaluate(&buyer(), &paper_id("q-fr-s1"), evaluation_request(110, 100))
        .unwrap_err();
    assert!(matches!(error, SubmissionError::InvalidMarks { .. }));
}

#[test]
fn storage_failure_leaves_the_record_unsubmitted() {
    let submissions = Arc::new(MemorySubmissions::default());
    let service = SubmissionService::new(
        Arc::new(MemoryPapers::seeded()),
        Arc::new(MemoryEnrollments::seeded()),
        submissions.clone(),
        Arc::new(RejectingFiles),
    );

    let error = service
        .submit(&buyer(), &paper_id("q-fr-s1"), upload("attempt.pdf"))
        .unwrap_err();
    assert!(matches!(error, SubmissionError::Files(_)));

    let stored = submissions.stored(BUYER, "q-fr-s1").expect("record exists");
    assert_eq!(stored.state, SubmissionState::Unsubmitted);
    assert!(stored.answer_sheet.is_none());
    assert!(!stored.suggested_answer_viewed);
}

#[test]
fn a_racing_view_wins_and_the_submit_observes_the_lock() {
    let inner = Arc::new(MemorySubmissions::default());
    let service = SubmissionService::new(
        Arc::new(MemoryPapers::seeded()),
        Arc::new(MemoryEnrollments::seeded()),
        Arc::new(ViewSnipedSubmissions::new(inner.clone())),
        Arc::new(MemoryFiles::with_suggested_answers()),
    );

    let error = service
        .submit(&buyer(), &paper_id("q-fr-s1"), upload("attempt.pdf"))
        .unwrap_err();
    assert!(matches!(error, SubmissionError::SubmissionLocked));

    // The record stayed coherent: still Unsubmitted, no answer-sheet
    // reference committed.
    let stored = inner.stored(BUYER, "q-fr-s1").expect("record exists");
    assert_eq!(stored.state, SubmissionState::Unsubmitted);
    assert!(stored.answer_sheet.is_none());
    assert!(stored.suggested_answer_viewed);
}

#[test]
fn submissions_outside_the_entitlement_are_denied() {
    let (service, submissions, _) = build_service();

    // series2-FR was never purchased.
    let error = service
        .submit(&buyer(), &paper_id("q-fr-s2"), upload("attempt.pdf"))
        .unwrap_err();
    assert!(matches!(
        error,
        SubmissionError::Entitlement(EntitlementError::Denied { .. })
    ));
    assert!(submissions.stored(BUYER, "q-fr-s2").is_none());
}

#[test]
fn unknown_buyers_are_not_enrolled() {
    let (service, _, _) = build_service();

    let error = service
        .submit(
            &crate::catalog::BuyerId("stranger".to_string()),
            &paper_id("q-fr-s1"),
            upload("attempt.pdf"),
        )
        .unwrap_err();
    assert!(matches!(
        error,
        SubmissionError::Entitlement(EntitlementError::NotEnrolled(_))
    ));
}

#[test]
fn missing_suggested_answer_is_reported() {
    let (service, _, _) = build_service();

    let error = service
        .view_suggested_answer(&buyer(), &paper_id("q-afm-s1"))
        .unwrap_err();
    assert!(matches!(error, SubmissionError::SuggestedAnswerMissing(_)));
}

#[test]
fn only_question_papers_accept_submissions() {
    let (service, _, _) = build_service();

    let error = service
        .submit(&buyer(), &paper_id("sa-fr-s1"), upload("attempt.pdf"))
        .unwrap_err();
    assert!(matches!(error, SubmissionError::NotAQuestionPaper(_)));

    let error = service
        .submit(&buyer(), &paper_id("nope"), upload("attempt.pdf"))
        .unwrap_err();
    assert!(matches!(error, SubmissionError::PaperNotFound(_)));
}
