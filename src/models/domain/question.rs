use serde::{Deserialize, Serialize};

use crate::models::domain::answer::{AnswerKey, QuestionType};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentStatus {
    Draft,
    Published,
    Archived,
}

impl ContentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentStatus::Draft => "draft",
            ContentStatus::Published => "published",
            ContentStatus::Archived => "archived",
        }
    }
}

/// Question as seen by the engine: identity, placement and answer key only.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Question {
    pub id: String,
    pub subtest_id: String,
    pub status: ContentStatus,
    pub answer_key: AnswerKey,
}

impl Question {
    pub fn question_type(&self) -> QuestionType {
        self.answer_key.question_type()
    }

    pub fn is_published(&self) -> bool {
        self.status == ContentStatus::Published
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct QuestionSetItem {
    pub question_id: String,
    pub sort_order: u32,
}

/// Curated practice set.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct QuestionSet {
    pub id: String,
    pub name: String,
    pub status: ContentStatus,
    pub items: Vec<QuestionSetItem>,
}

impl QuestionSet {
    /// Question ids in the set's sort order.
    pub fn ordered_question_ids(&self) -> Vec<String> {
        let mut items: Vec<&QuestionSetItem> = self.items.iter().collect();
        items.sort_by_key(|item| item.sort_order);
        items.into_iter().map(|item| item.question_id.clone()).collect()
    }
}
