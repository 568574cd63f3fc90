use std::sync::Arc;

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::catalog::{
    BuyerId, CatalogError, Paper, PaperCatalog, PaperFilter, PaperId, PaperType,
};
use crate::entitlement::{ensure_entitled, EnrollmentStore, EnrollmentStoreError, EntitlementError};

use super::domain::{AnswerSheetUpload, Evaluation, Submission, SubmissionState};
use super::repository::{
    AnswerSheetStore, FileStoreError, SubmissionStore, SubmissionStoreError, UpdateGuard,
};
use super::stats;
pub use super::stats::PaperStatistics;

/// Service driving one buyer's answer-sheet lifecycle against a question
/// paper, including the suggested-answer fairness lock.
pub struct SubmissionService<P, E, S, F> {
    papers: Arc<P>,
    enrollments: Arc<E>,
    submissions: Arc<S>,
    files: Arc<F>,
}

/// Evaluator verdict payload for the terminal transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationRequest {
    pub marks_obtained: u16,
    pub max_marks: u16,
    pub comments: String,
    pub evaluated_sheet: AnswerSheetUpload,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluated_on: Option<NaiveDate>,
}

/// Result of a suggested-answer view: the artifact URL plus whether this
/// view (irreversibly) forfeited the buyer's submission right.
#[derive(Debug, Clone, Serialize)]
pub struct SuggestedAnswerView {
    pub paper: PaperId,
    pub url: String,
    pub submission_locked: bool,
}

impl<P, E, S, F> SubmissionService<P, E, S, F>
where
    P: PaperCatalog + 'static,
    E: EnrollmentStore + 'static,
    S: SubmissionStore + 'static,
    F: AnswerSheetStore + 'static,
{
    pub fn new(papers: Arc<P>, enrollments: Arc<E>, submissions: Arc<S>, files: Arc<F>) -> Self {
        Self {
            papers,
            enrollments,
            submissions,
            files,
        }
    }

    /// Hand out the suggested-answer artifact for a question paper. Always
    /// permitted; viewing while still Unsubmitted permanently forfeits the
    /// right to submit for this (buyer, paper) pair.
    pub fn view_suggested_answer(
        &self,
        buyer: &BuyerId,
        paper_id: &PaperId,
    ) -> Result<SuggestedAnswerView, SubmissionError> {
        let paper = self.question_paper(paper_id)?;
        self.ensure_buyer_entitled(buyer, &paper)?;

        let suggested = self.companion_suggested_answer(&paper)?;
        let url = self.files.url(&suggested.storage_ref)?;

        let submission = self.submissions.create_or_get(buyer, paper_id)?;
        let mut locked = submission.locked();
        if submission.state == SubmissionState::Unsubmitted && !submission.suggested_answer_viewed {
            let mut flagged = submission;
            flagged.suggested_answer_viewed = true;
            match self.submissions.update_guarded(
                flagged,
                UpdateGuard::on_state_and_flag(SubmissionState::Unsubmitted, false),
            ) {
                Ok(()) => locked = true,
                // Lost the race to a concurrent submit (or view); the viewed
                // flag then carries no penalty, so the view still succeeds.
                Err(SubmissionStoreError::Conflict) => {
                    locked = self.submissions.create_or_get(buyer, paper_id)?.locked();
                }
                Err(other) => return Err(other.into()),
            }
        }

        Ok(SuggestedAnswerView {
            paper: paper.id,
            url,
            submission_locked: locked,
        })
    }

    /// Submit an answer sheet. Only possible from Unsubmitted with the
    /// suggested answer still unseen. The sheet is durably stored before the
    /// state commit; a storage failure leaves the record Unsubmitted.
    pub fn submit(
        &self,
        buyer: &BuyerId,
        paper_id: &PaperId,
        upload: AnswerSheetUpload,
    ) -> Result<Submission, SubmissionError> {
        let paper = self.question_paper(paper_id)?;
        self.ensure_buyer_entitled(buyer, &paper)?;

        let submission = self.submissions.create_or_get(buyer, paper_id)?;
        if submission.state != SubmissionState::Unsubmitted {
            return Err(SubmissionError::AlreadySubmitted);
        }
        if submission.suggested_answer_viewed {
            return Err(SubmissionError::SubmissionLocked);
        }

        let stored = self.files.store(buyer, paper_id, upload)?;

        let mut updated = submission;
        updated.answer_sheet = Some(stored);
        updated.state = SubmissionState::Submitted;

        match self.submissions.update_guarded(
            updated.clone(),
            UpdateGuard::on_state_and_flag(SubmissionState::Unsubmitted, false),
        ) {
            Ok(()) => Ok(updated),
            Err(SubmissionStoreError::Conflict) => {
                // A concurrent view or submit won; report the violation the
                // record now exhibits.
                let current = self.submissions.create_or_get(buyer, paper_id)?;
                if current.locked() {
                    Err(SubmissionError::SubmissionLocked)
                } else if current.state != SubmissionState::Unsubmitted {
                    Err(SubmissionError::AlreadySubmitted)
                } else {
                    Err(SubmissionStoreError::Conflict.into())
                }
            }
            Err(other) => Err(other.into()),
        }
    }

    /// Evaluator transition: record marks and the evaluated sheet. Only
    /// possible from Submitted.
    pub fn evaluate(
        &self,
        buyer: &BuyerId,
        paper_id: &PaperId,
        request: EvaluationRequest,
    ) -> Result<Submission, SubmissionError> {
        self.question_paper(paper_id)?;

        if request.marks_obtained > request.max_marks {
            return Err(SubmissionError::InvalidMarks {
                marks_obtained: request.marks_obtained,
                max_marks: request.max_marks,
            });
        }

        let submission = self.submissions.create_or_get(buyer, paper_id)?;
        match submission.state {
            SubmissionState::Unsubmitted => return Err(SubmissionError::NotYetSubmitted),
            SubmissionState::Evaluated => return Err(SubmissionError::AlreadyEvaluated),
            SubmissionState::Submitted => {}
        }

        let evaluated_sheet = self.files.store(buyer, paper_id, request.evaluated_sheet)?;

        let mut updated = submission;
        updated.state = SubmissionState::Evaluated;
        updated.evaluation = Some(Evaluation {
            marks_obtained: request.marks_obtained,
            max_marks: request.max_marks,
            comments: request.comments,
            evaluated_sheet,
            evaluated_on: request
                .evaluated_on
                .unwrap_or_else(|| Local::now().date_naive()),
        });

        match self
            .submissions
            .update_guarded(updated.clone(), UpdateGuard::on_state(SubmissionState::Submitted))
        {
            Ok(()) => Ok(updated),
            Err(SubmissionStoreError::Conflict) => Err(SubmissionError::AlreadyEvaluated),
            Err(other) => Err(other.into()),
        }
    }

    /// Read-only score aggregates for a question paper, recomputed from the
    /// store on every call.
    pub fn paper_statistics(&self, paper_id: &PaperId) -> Result<PaperStatistics, SubmissionError> {
        self.question_paper(paper_id)?;
        Ok(stats::paper_statistics(self.submissions.as_ref(), paper_id)?)
    }

    pub fn status(&self, buyer: &BuyerId, paper_id: &PaperId) -> Result<Submission, SubmissionError> {
        self.question_paper(paper_id)?;
        Ok(self.submissions.create_or_get(buyer, paper_id)?)
    }

    fn question_paper(&self, paper_id: &PaperId) -> Result<Paper, SubmissionError> {
        let paper = self
            .papers
            .paper(paper_id)?
            .ok_or_else(|| SubmissionError::PaperNotFound(paper_id.0.clone()))?;
        if paper.paper_type != PaperType::Question {
            return Err(SubmissionError::NotAQuestionPaper(paper_id.0.clone()));
        }
        Ok(paper)
    }

    fn ensure_buyer_entitled(&self, buyer: &BuyerId, paper: &Paper) -> Result<(), SubmissionError> {
        let enrollment = self
            .enrollments
            .fetch(buyer, &paper.product)?
            .ok_or_else(|| EntitlementError::NotEnrolled(paper.product.0.clone()))?;
        ensure_entitled(&enrollment, paper)?;
        Ok(())
    }

    fn companion_suggested_answer(&self, paper: &Paper) -> Result<Paper, SubmissionError> {
        let filter = PaperFilter {
            group: Some(paper.group.clone()),
            subject: Some(paper.subject),
            series: paper.series,
            paper_type: Some(PaperType::SuggestedAnswer),
            available_on: None,
        };
        self.papers
            .papers(&paper.product, &filter)?
            .into_iter()
            .find(|candidate| {
                candidate.paper_number == paper.paper_number && candidate.series == paper.series
            })
            .ok_or_else(|| SubmissionError::SuggestedAnswerMissing(paper.id.0.clone()))
    }
}

/// Error raised by the submission workflow. The four state-machine variants
/// are surfaced to callers verbatim and never retried.
#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("the suggested answer was viewed before submission; submitting is permanently locked")]
    SubmissionLocked,
    #[error("an answer sheet was already submitted for this paper")]
    AlreadySubmitted,
    #[error("no answer sheet has been submitted for this paper yet")]
    NotYetSubmitted,
    #[error("this submission was already evaluated")]
    AlreadyEvaluated,
    #[error("paper '{0}' not found")]
    PaperNotFound(String),
    #[error("paper '{0}' is not a question paper")]
    NotAQuestionPaper(String),
    #[error("no suggested answer has been uploaded for paper '{0}'")]
    SuggestedAnswerMissing(String),
    #[error("marks obtained ({marks_obtained}) cannot exceed maximum marks ({max_marks})")]
    InvalidMarks { marks_obtained: u16, max_marks: u16 },
    #[error(transparent)]
    Entitlement(#[from] EntitlementError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Store(#[from] SubmissionStoreError),
    #[error(transparent)]
    Enrollments(#[from] EnrollmentStoreError),
    #[error(transparent)]
    Files(#[from] FileStoreError),
}
