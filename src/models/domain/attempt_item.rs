use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::domain::{
    answer::{QuestionType, UserAnswer},
    question::Question,
};

/// One question slot within an attempt.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct AttemptItem {
    pub id: String,
    pub attempt_id: String,
    pub question_id: String,
    pub question_type: QuestionType,
    pub sort_order: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_index: Option<u32>,
    pub user_answer: UserAnswer,
    /// `None` means blank or ungraded.
    pub is_correct: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partial_score: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answered_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_spent_seconds: Option<i64>,
}

impl AttemptItem {
    pub fn new(
        attempt_id: &str,
        question: &Question,
        sort_order: u32,
        section_index: Option<u32>,
    ) -> Self {
        let question_type = question.question_type();

        AttemptItem {
            id: Uuid::new_v4().to_string(),
            attempt_id: attempt_id.to_string(),
            question_id: question.id.clone(),
            question_type,
            sort_order,
            section_index,
            user_answer: UserAnswer::blank(question_type),
            is_correct: None,
            partial_score: None,
            answered_at: None,
            time_spent_seconds: None,
        }
    }
}

/// Scoped update applied by a successful answer submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ItemAnswerUpdate {
    pub user_answer: UserAnswer,
    pub is_correct: Option<bool>,
    pub partial_score: Option<u8>,
    pub answered_at: DateTime<Utc>,
    pub time_spent_seconds: Option<i64>,
}

impl ItemAnswerUpdate {
    pub fn apply_to(&self, item: &mut AttemptItem) {
        item.user_answer = self.user_answer.clone();
        item.is_correct = self.is_correct;
        item.partial_score = self.partial_score;
        item.answered_at = Some(self.answered_at);
        if self.time_spent_seconds.is_some() {
            item.time_spent_seconds = self.time_spent_seconds;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::domain::{answer::AnswerKey, question::ContentStatus};

    fn complex_question() -> Question {
        Question {
            id: "q-1".to_string(),
            subtest_id: "pk".to_string(),
            status: ContentStatus::Published,
            answer_key: AnswerKey::ComplexSelection {
                rows: vec!["true".to_string(), "false".to_string()],
            },
        }
    }

    #[test]
    fn new_item_starts_blank_with_type_shape() {
        let item = AttemptItem::new("attempt-1", &complex_question(), 4, Some(1));

        assert_eq!(item.attempt_id, "attempt-1");
        assert_eq!(item.question_type, QuestionType::ComplexSelection);
        assert_eq!(
            item.user_answer,
            UserAnswer::ComplexSelection {
                selections: Vec::new()
            }
        );
        assert_eq!(item.section_index, Some(1));
        assert!(item.is_correct.is_none());
        assert!(item.answered_at.is_none());
    }

    #[test]
    fn answer_update_keeps_previous_time_when_none_reported() {
        let mut item = AttemptItem::new("attempt-1", &complex_question(), 0, None);
        item.time_spent_seconds = Some(12);

        let update = ItemAnswerUpdate {
            user_answer: UserAnswer::ComplexSelection {
                selections: vec![Some("true".to_string())],
            },
            is_correct: Some(false),
            partial_score: Some(50),
            answered_at: Utc::now(),
            time_spent_seconds: None,
        };
        update.apply_to(&mut item);

        assert_eq!(item.is_correct, Some(false));
        assert_eq!(item.partial_score, Some(50));
        assert_eq!(item.time_spent_seconds, Some(12));
        assert!(item.answered_at.is_some());
    }
}
