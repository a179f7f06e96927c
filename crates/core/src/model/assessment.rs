use serde::{Deserialize, Serialize};

use crate::model::{AttemptId, OptionId, QuestionId, QuizId};

/// How a question accepts selections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestionType {
    McqSingle,
    McqMulti,
    TrueFalse,
    /// Any type this client does not know; treated as multi-select.
    #[serde(other)]
    Other,
}

impl QuestionType {
    /// Single-select types keep at most one selected option.
    #[must_use]
    pub fn is_single_select(self) -> bool {
        matches!(self, QuestionType::McqSingle | QuestionType::TrueFalse)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionOption {
    pub id: OptionId,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub id: QuestionId,
    pub kind: QuestionType,
    pub prompt: String,
    pub options: Vec<QuestionOption>,
}

/// Lifecycle of a quiz attempt as reported by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttemptStatus {
    InProgress,
    Submitted,
    Graded,
    #[serde(other)]
    Unknown,
}

impl AttemptStatus {
    /// Only an in-progress attempt accepts answers.
    #[must_use]
    pub fn is_open(self) -> bool {
        matches!(self, AttemptStatus::InProgress)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    pub id: AttemptId,
    pub quiz_id: QuizId,
    pub status: AttemptStatus,
}

/// Score summary returned by a successful submit.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AttemptResult {
    pub score: Option<f64>,
    pub max_score: Option<f64>,
}
