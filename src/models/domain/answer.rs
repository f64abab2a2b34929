use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    SingleChoice,     // One correct letter
    ComplexSelection, // One correct value per row
    FillIn,           // Free text against accepted strings
}

/// Answer key for one question, tagged by question kind.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnswerKey {
    SingleChoice {
        correct: String,
    },
    ComplexSelection {
        /// Correct value for each row, in row order.
        rows: Vec<String>,
    },
    FillIn {
        accepted: Vec<String>,
        #[serde(default)]
        case_sensitive: bool,
        /// Fallback pattern tried against the raw answer when no accepted
        /// string matches.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pattern: Option<String>,
    },
}

impl AnswerKey {
    pub fn question_type(&self) -> QuestionType {
        match self {
            AnswerKey::SingleChoice { .. } => QuestionType::SingleChoice,
            AnswerKey::ComplexSelection { .. } => QuestionType::ComplexSelection,
            AnswerKey::FillIn { .. } => QuestionType::FillIn,
        }
    }
}

/// A student's answer, tagged the same way as [`AnswerKey`].
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UserAnswer {
    SingleChoice {
        #[serde(default)]
        selected: Option<String>,
    },
    ComplexSelection {
        /// Parallel to the key's rows; may be shorter, `None` marks an
        /// unselected row.
        #[serde(default)]
        selections: Vec<Option<String>>,
    },
    FillIn {
        #[serde(default)]
        value: Option<String>,
    },
}

impl UserAnswer {
    /// The unanswered shape stored on every item at creation.
    pub fn blank(question_type: QuestionType) -> Self {
        match question_type {
            QuestionType::SingleChoice => UserAnswer::SingleChoice { selected: None },
            QuestionType::ComplexSelection => UserAnswer::ComplexSelection {
                selections: Vec::new(),
            },
            QuestionType::FillIn => UserAnswer::FillIn { value: None },
        }
    }

    pub fn question_type(&self) -> QuestionType {
        match self {
            UserAnswer::SingleChoice { .. } => QuestionType::SingleChoice,
            UserAnswer::ComplexSelection { .. } => QuestionType::ComplexSelection,
            UserAnswer::FillIn { .. } => QuestionType::FillIn,
        }
    }
}
