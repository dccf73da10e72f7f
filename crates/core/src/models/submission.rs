use serde::{Deserialize, Serialize};

/// Canvas submission workflow state.
///
/// Only [`WorkflowState::Submitted`] matters for completion tracking; the
/// other states are kept so payloads can be shown as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum WorkflowState {
    Submitted,
    Unsubmitted,
    Graded,
    PendingReview,
    Other(String),
}

impl WorkflowState {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Submitted => "submitted",
            Self::Unsubmitted => "unsubmitted",
            Self::Graded => "graded",
            Self::PendingReview => "pending_review",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for WorkflowState {
    fn from(s: String) -> Self {
        match s.as_str() {
            "submitted" => Self::Submitted,
            "unsubmitted" => Self::Unsubmitted,
            "graded" => Self::Graded,
            "pending_review" => Self::PendingReview,
            _ => Self::Other(s),
        }
    }
}

impl From<WorkflowState> for String {
    fn from(state: WorkflowState) -> Self {
        state.as_str().to_string()
    }
}

/// A Canvas submission, identified by the assignment it belongs to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Submission {
    pub assignment_id: String,
    pub workflow_state: WorkflowState,
    pub submitted_at: Option<String>,
    pub score: Option<f64>,
    pub grade: Option<String>,
}

impl Submission {
    /// Whether the student actually turned the work in (not just drafted it).
    pub fn is_turned_in(&self) -> bool {
        self.workflow_state == WorkflowState::Submitted
            && self.submitted_at.as_deref().is_some_and(|at| !at.is_empty())
    }
}
