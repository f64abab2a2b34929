use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::domain::results::AttemptResults;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptMode {
    Practice,
    Tryout,
}

impl std::fmt::Display for AttemptMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttemptMode::Practice => write!(f, "practice"),
            AttemptMode::Tryout => write!(f, "tryout"),
        }
    }
}

/// Status only ever moves from `InProgress` to `Completed`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    InProgress,
    Completed,
}

impl AttemptStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttemptStatus::InProgress => "in_progress",
            AttemptStatus::Completed => "completed",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeMode {
    Relaxed,
    Timed,
}

/// Where a tryout stands in its blueprint.
///
/// `NotStarted` is the fresh attempt (section 0, no clock). `Active` has a
/// running clock for `index`. `Advancing` sits between sections: `index` is
/// the next section to start, or the section count once every section has
/// ended and the attempt awaits finalization.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SectionProgress {
    NotStarted,
    Active {
        index: u32,
        started_at: DateTime<Utc>,
    },
    Advancing {
        index: u32,
    },
}

impl SectionProgress {
    pub fn current_index(&self) -> u32 {
        match self {
            SectionProgress::NotStarted => 0,
            SectionProgress::Active { index, .. } | SectionProgress::Advancing { index } => *index,
        }
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        match self {
            SectionProgress::Active { started_at, .. } => Some(*started_at),
            _ => None,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, SectionProgress::Active { .. })
    }
}

/// Mode-specific state. Exactly one of blueprint / question set is present.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum AttemptSession {
    Practice {
        question_set_id: String,
        time_mode: TimeMode,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        time_limit_seconds: Option<i64>,
    },
    Tryout {
        blueprint_id: String,
        progress: SectionProgress,
    },
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Attempt {
    pub id: String,
    pub user_id: String,
    pub session: AttemptSession,
    pub status: AttemptStatus,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_time_seconds: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<AttemptResults>,
}

impl Attempt {
    pub fn new_tryout(user_id: &str, blueprint_id: &str, started_at: DateTime<Utc>) -> Self {
        Self::new(
            user_id,
            AttemptSession::Tryout {
                blueprint_id: blueprint_id.to_string(),
                progress: SectionProgress::NotStarted,
            },
            started_at,
        )
    }

    pub fn new_practice(
        user_id: &str,
        question_set_id: &str,
        time_mode: TimeMode,
        time_limit_seconds: Option<i64>,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self::new(
            user_id,
            AttemptSession::Practice {
                question_set_id: question_set_id.to_string(),
                time_mode,
                time_limit_seconds,
            },
            started_at,
        )
    }

    fn new(user_id: &str, session: AttemptSession, started_at: DateTime<Utc>) -> Self {
        Attempt {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            session,
            status: AttemptStatus::InProgress,
            started_at,
            completed_at: None,
            total_time_seconds: None,
            results: None,
        }
    }

    pub fn mode(&self) -> AttemptMode {
        match self.session {
            AttemptSession::Practice { .. } => AttemptMode::Practice,
            AttemptSession::Tryout { .. } => AttemptMode::Tryout,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == AttemptStatus::Completed
    }

    /// Blueprint id and progress, for tryout attempts only.
    pub fn tryout_progress(&self) -> Option<(&str, SectionProgress)> {
        match &self.session {
            AttemptSession::Tryout {
                blueprint_id,
                progress,
            } => Some((blueprint_id.as_str(), *progress)),
            AttemptSession::Practice { .. } => None,
        }
    }
}

/// Fields written by the single completion update.
#[derive(Clone, Debug, PartialEq)]
pub struct AttemptCompletion {
    pub completed_at: DateTime<Utc>,
    pub total_time_seconds: i64,
    pub results: AttemptResults,
}
