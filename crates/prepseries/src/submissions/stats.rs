use serde::{Deserialize, Serialize};

use crate::catalog::PaperId;

use super::domain::SubmissionState;
use super::repository::{SubmissionStore, SubmissionStoreError};

/// Comparative performance for one question paper, folded over its
/// evaluated submissions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PaperStatistics {
    pub highest_score: u16,
    pub average_score: f32,
    pub submission_count: u32,
}

impl PaperStatistics {
    pub const EMPTY: PaperStatistics = PaperStatistics {
        highest_score: 0,
        average_score: 0.0,
        submission_count: 0,
    };
}

/// Recompute the aggregates from current data. No cache sits between calls;
/// a paper with no evaluated submissions yields the all-zero value, not an
/// error.
pub fn paper_statistics<S>(
    store: &S,
    paper: &PaperId,
) -> Result<PaperStatistics, SubmissionStoreError>
where
    S: SubmissionStore + ?Sized,
{
    let mut highest: u16 = 0;
    let mut total: u64 = 0;
    let mut count: u32 = 0;

    for submission in store.list_for_paper(paper)? {
        if submission.state != SubmissionState::Evaluated {
            continue;
        }
        let Some(evaluation) = submission.evaluation else {
            continue;
        };
        highest = highest.max(evaluation.marks_obtained);
        total += u64::from(evaluation.marks_obtained);
        count += 1;
    }

    if count == 0 {
        return Ok(PaperStatistics::EMPTY);
    }

    Ok(PaperStatistics {
        highest_score: highest,
        average_score: total as f32 / count as f32,
        submission_count: count,
    })
}
