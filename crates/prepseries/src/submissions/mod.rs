//! Answer-sheet submission lifecycle: one state machine per (buyer, paper)
//! pair, the irreversible suggested-answer fairness lock, and the read-only
//! score aggregates computed over evaluated sheets.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;
pub mod stats;

#[cfg(test)]
mod tests;

pub use domain::{
    AnswerSheetUpload, Evaluation, Submission, SubmissionState, SubmissionStatusView,
};
pub use repository::{
    AnswerSheetStore, FileStoreError, SubmissionStore, SubmissionStoreError, UpdateGuard,
};
pub use router::submission_router;
pub use service::{
    EvaluationRequest, SubmissionError, SubmissionService, SuggestedAnswerView,
};
pub use stats::{paper_statistics, PaperStatistics};
