use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::catalog::{BuyerId, PaperId, StorageRef};

/// Lifecycle of one buyer's attempt against one question paper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionState {
    Unsubmitted,
    Submitted,
    Evaluated,
}

impl SubmissionState {
    pub const fn label(self) -> &'static str {
        match self {
            SubmissionState::Unsubmitted => "unsubmitted",
            SubmissionState::Submitted => "submitted",
            SubmissionState::Evaluated => "evaluated",
        }
    }
}

/// Evaluator verdict recorded once a sheet reaches the terminal state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    pub marks_obtained: u16,
    pub max_marks: u16,
    pub comments: String,
    pub evaluated_sheet: StorageRef,
    pub evaluated_on: NaiveDate,
}

/// One buyer's answer-sheet record for one question paper. Created lazily
/// (as Unsubmitted) on first interaction and never deleted.
///
/// `suggested_answer_viewed` is monotonic: once set while the record is
/// still Unsubmitted, the submit transition is forfeited for good.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub buyer: BuyerId,
    pub paper: PaperId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer_sheet: Option<StorageRef>,
    pub suggested_answer_viewed: bool,
    pub state: SubmissionState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluation: Option<Evaluation>,
}

impl Submission {
    pub fn fresh(buyer: BuyerId, paper: PaperId) -> Self {
        Self {
            buyer,
            paper,
            answer_sheet: None,
            suggested_answer_viewed: false,
            state: SubmissionState::Unsubmitted,
            evaluation: None,
        }
    }

    /// Whether the fairness lock bars this record from ever being submitted.
    pub const fn locked(&self) -> bool {
        self.suggested_answer_viewed && matches!(self.state, SubmissionState::Unsubmitted)
    }

    pub fn status_view(&self) -> SubmissionStatusView {
        SubmissionStatusView {
            buyer: self.buyer.clone(),
            paper: self.paper.clone(),
            status: self.state.label(),
            suggested_answer_viewed: self.suggested_answer_viewed,
            submission_locked: self.locked(),
            marks_obtained: self.evaluation.as_ref().map(|e| e.marks_obtained),
            max_marks: self.evaluation.as_ref().map(|e| e.max_marks),
        }
    }
}

/// Sanitized representation exposed over the API.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionStatusView {
    pub buyer: BuyerId,
    pub paper: PaperId,
    pub status: &'static str,
    pub suggested_answer_viewed: bool,
    pub submission_locked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marks_obtained: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_marks: Option<u16>,
}

/// Raw answer-sheet payload handed to the file-storage collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerSheetUpload {
    pub file_name: String,
    #[serde(with = "hex_payload")]
    pub content: Vec<u8>,
}

mod hex_payload {
    //! Compact hex transport for small demo payloads; real deployments hand
    //! over multipart uploads before the core is invoked.
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        let encoded: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
        serializer.serialize_str(&encoded)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        // Slicing by byte offset below is only safe on ASCII input.
        if !raw.is_ascii() {
            return Err(serde::de::Error::custom("invalid hex payload"));
        }
        if raw.len() % 2 != 0 {
            return Err(serde::de::Error::custom("odd-length hex payload"));
        }
        (0..raw.len())
            .step_by(2)
            .map(|i| {
                u8::from_str_radix(&raw[i..i + 2], 16)
                    .map_err(|_| serde::de::Error::custom("invalid hex payload"))
            })
            .collect()
    }
}
