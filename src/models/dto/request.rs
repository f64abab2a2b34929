use serde::Deserialize;
use validator::Validate;

use crate::models::domain::{attempt::TimeMode, answer::UserAnswer};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreatePracticeSessionRequest {
    pub time_mode: TimeMode,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SubmitAnswerRequest {
    pub answer: UserAnswer,

    /// Client-reported time on the question. Advisory only, never used for expiry.
    #[validate(range(min = 0, max = 86_400))]
    pub time_spent_seconds: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PaginationParams {
    #[validate(range(min = 0))]
    pub offset: Option<i64>,

    #[validate(range(min = 1, max = 100))]
    pub limit: Option<i64>,
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            offset: Some(0),
            limit: Some(20),
        }
    }
}

impl PaginationParams {
    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0)
    }

    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(20).min(100)
    }
}
