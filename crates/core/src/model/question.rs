use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::DrillId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("invalid drill document: {0}")]
    Parse(String),
}

//
// ─── OPTION ────────────────────────────────────────────────────────────────────
//

/// An answer choice. Content may use bare labels or `{id, text}` pairs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QuestionOption {
    Keyed { id: String, text: String },
    Label(String),
}

impl QuestionOption {
    /// The value compared against `correct_answer`.
    #[must_use]
    pub fn identity(&self) -> &str {
        match self {
            QuestionOption::Keyed { id, .. } => id,
            QuestionOption::Label(label) => label,
        }
    }

    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            QuestionOption::Keyed { text, .. } => text,
            QuestionOption::Label(label) => label,
        }
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: u32,
    pub text: String,
    pub options: Vec<QuestionOption>,
    pub correct_answer: String,
    #[serde(default)]
    pub explanation: String,
}

impl Question {
    /// Exact match of a selected option identity against the answer key.
    #[must_use]
    pub fn is_correct(&self, option_id: &str) -> bool {
        option_id == self.correct_answer
    }

    /// Whether the question can be scored at all: at least two options and
    /// exactly one of them matching the answer key.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        self.options.len() >= 2
            && self
                .options
                .iter()
                .filter(|o| o.identity() == self.correct_answer)
                .count()
                == 1
    }
}

//
// ─── DRILL ─────────────────────────────────────────────────────────────────────
//

/// A static question sequence for one study module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Drill {
    pub id: DrillId,
    pub title: String,
    pub domain: String,
    pub questions: Vec<Question>,
}

impl Drill {
    /// # Errors
    ///
    /// Returns `QuestionError::Parse` if the document is not a valid drill.
    pub fn from_json(raw: &str) -> Result<Self, QuestionError> {
        serde_json::from_str(raw).map_err(|e| QuestionError::Parse(e.to_string()))
    }

    /// Ids of questions that can never be scored correct.
    #[must_use]
    pub fn malformed_questions(&self) -> Vec<u32> {
        self.questions
            .iter()
            .filter(|q| !q.is_well_formed())
            .map(|q| q.id)
            .collect()
    }
}
