use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    models::domain::{attempt::Attempt, attempt_item::AttemptItem},
    services::section_clock::SectionTimer,
};

#[derive(Debug, Clone, Serialize)]
pub struct CreateAttemptResponse {
    pub attempt_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionStartResponse {
    pub section_index: u32,
    pub section_started_at: DateTime<Utc>,
    pub server_time: DateTime<Utc>,
    pub duration_seconds: i64,
    pub remaining_seconds: i64,
}

impl SectionStartResponse {
    pub fn from_timer(section_index: u32, timer: SectionTimer) -> Self {
        Self {
            section_index,
            section_started_at: timer.started_at,
            server_time: timer.server_time,
            duration_seconds: timer.duration_seconds,
            remaining_seconds: timer.remaining_seconds,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionEndResponse {
    pub is_completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_section_index: Option<u32>,
}

impl SectionEndResponse {
    /// Outcome of ending `section_index` in a blueprint of `section_count` sections.
    pub fn after(section_index: u32, section_count: u32) -> Self {
        let next = section_index + 1;
        if next >= section_count {
            Self {
                is_completed: true,
                next_section_index: None,
            }
        } else {
            Self {
                is_completed: false,
                next_section_index: Some(next),
            }
        }
    }
}

/// Full attempt state a client reloads from.
#[derive(Debug, Clone, Serialize)]
pub struct AttemptDetailResponse {
    pub attempt: Attempt,
    pub items: Vec<AttemptItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timer: Option<SectionTimer>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttemptListResponse {
    pub attempts: Vec<Attempt>,
    pub total: i64,
    pub offset: i64,
    pub limit: i64,
}
