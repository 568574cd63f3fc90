use crate::catalog::{BuyerId, PaperId, StorageRef};

use super::domain::{AnswerSheetUpload, Submission, SubmissionState};

/// Precondition for a guarded write. The store must compare against the
/// currently persisted record and reject with `Conflict` on any mismatch, in
/// the same atomic step as the write itself. This is the single point of
/// serialization for a (buyer, paper) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateGuard {
    pub state: SubmissionState,
    /// `None` leaves the viewed flag unchecked (evaluation does not care).
    pub suggested_answer_viewed: Option<bool>,
}

impl UpdateGuard {
    pub const fn on_state(state: SubmissionState) -> Self {
        Self {
            state,
            suggested_answer_viewed: None,
        }
    }

    pub const fn on_state_and_flag(state: SubmissionState, viewed: bool) -> Self {
        Self {
            state,
            suggested_answer_viewed: Some(viewed),
        }
    }

    pub fn admits(&self, current: &Submission) -> bool {
        if current.state != self.state {
            return false;
        }
        match self.suggested_answer_viewed {
            Some(expected) => current.suggested_answer_viewed == expected,
            None => true,
        }
    }
}

/// Persistence seam for submission records.
pub trait SubmissionStore: Send + Sync {
    /// Fetch the record for (buyer, paper), creating a fresh Unsubmitted one
    /// on first contact.
    fn create_or_get(&self, buyer: &BuyerId, paper: &PaperId)
        -> Result<Submission, SubmissionStoreError>;

    /// Replace the stored record, but only while the guard still admits the
    /// currently persisted one. Compare and write must be one atomic step.
    fn update_guarded(
        &self,
        submission: Submission,
        guard: UpdateGuard,
    ) -> Result<(), SubmissionStoreError>;

    /// Every record referencing the given paper, across buyers.
    fn list_for_paper(&self, paper: &PaperId) -> Result<Vec<Submission>, SubmissionStoreError>;
}

/// Error enumeration for submission persistence.
#[derive(Debug, thiserror::Error)]
pub enum SubmissionStoreError {
    #[error("submission no longer matches the expected state")]
    Conflict,
    #[error("no submission record exists for this buyer and paper")]
    NotFound,
    #[error("submission store unavailable: {0}")]
    Unavailable(String),
}

/// External file-storage collaborator. Uploads must be durable before the
/// caller commits any state transition that references them.
pub trait AnswerSheetStore: Send + Sync {
    fn store(
        &self,
        buyer: &BuyerId,
        paper: &PaperId,
        upload: AnswerSheetUpload,
    ) -> Result<StorageRef, FileStoreError>;

    /// Short-lived download URL for a stored artifact.
    fn url(&self, reference: &StorageRef) -> Result<String, FileStoreError>;
}

/// Error enumeration for the file-storage seam.
#[derive(Debug, thiserror::Error)]
pub enum FileStoreError {
    #[error("file storage rejected the upload: {0}")]
    Rejected(String),
    #[error("no stored artifact for reference '{0}'")]
    MissingArtifact(String),
    #[error("file storage unavailable: {0}")]
    Unavailable(String),
}
