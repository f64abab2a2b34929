use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};

use crate::{
    config::ExamPolicy,
    models::domain::{
        answer::AnswerKey,
        blueprint::{Blueprint, BlueprintSection},
        question::{ContentStatus, Question, QuestionSet, QuestionSetItem},
    },
    repositories::memory::{
        InMemoryAttemptRepository, InMemoryBlueprintRepository, InMemoryQuestionRepository,
        InMemoryQuestionSetRepository,
    },
    services::{attempt_session_service::AttemptSessionService, section_clock::ManualClock},
};

#[cfg(test)]
pub mod fixtures {
    use super::*;

    pub fn epoch() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap()
    }

    pub fn single_choice(id: &str, subtest_id: &str, correct: &str) -> Question {
        Question {
            id: id.to_string(),
            subtest_id: subtest_id.to_string(),
            status: ContentStatus::Published,
            answer_key: AnswerKey::SingleChoice {
                correct: correct.to_string(),
            },
        }
    }

    pub fn fill_in(id: &str, subtest_id: &str, accepted: &[&str]) -> Question {
        Question {
            id: id.to_string(),
            subtest_id: subtest_id.to_string(),
            status: ContentStatus::Published,
            answer_key: AnswerKey::FillIn {
                accepted: accepted.iter().map(|s| s.to_string()).collect(),
                case_sensitive: false,
                pattern: None,
            },
        }
    }

    pub fn section(subtest_id: &str, question_count: u32, duration_seconds: i64) -> BlueprintSection {
        BlueprintSection {
            subtest_id: subtest_id.to_string(),
            name: subtest_id.to_uppercase(),
            question_count,
            duration_seconds,
        }
    }

    pub fn blueprint(id: &str, sections: Vec<BlueprintSection>) -> Blueprint {
        Blueprint {
            id: id.to_string(),
            name: format!("Blueprint {}", id),
            is_active: true,
            sections,
        }
    }

    pub fn question_set(id: &str, status: ContentStatus, question_ids: &[&str]) -> QuestionSet {
        QuestionSet {
            id: id.to_string(),
            name: format!("Set {}", id),
            status,
            items: question_ids
                .iter()
                .enumerate()
                .map(|(position, question_id)| QuestionSetItem {
                    question_id: question_id.to_string(),
                    sort_order: position as u32,
                })
                .collect(),
        }
    }
}

/// Session service wired to in-memory repositories and a manual clock.
#[cfg(test)]
pub struct SessionHarness {
    pub attempts: Arc<InMemoryAttemptRepository>,
    pub questions: Arc<InMemoryQuestionRepository>,
    pub blueprints: Arc<InMemoryBlueprintRepository>,
    pub question_sets: Arc<InMemoryQuestionSetRepository>,
    pub clock: Arc<ManualClock>,
    pub service: AttemptSessionService,
}

#[cfg(test)]
impl SessionHarness {
    pub fn new() -> Self {
        let attempts = Arc::new(InMemoryAttemptRepository::new());
        let questions = Arc::new(InMemoryQuestionRepository::new());
        let blueprints = Arc::new(InMemoryBlueprintRepository::new());
        let question_sets = Arc::new(InMemoryQuestionSetRepository::new());
        let clock = Arc::new(ManualClock::new(fixtures::epoch()));

        let service = AttemptSessionService::new(
            attempts.clone(),
            questions.clone(),
            blueprints.clone(),
            question_sets.clone(),
            clock.clone(),
            ExamPolicy::default(),
        );

        Self {
            attempts,
            questions,
            blueprints,
            question_sets,
            clock,
            service,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;

    #[test]
    fn test_fixtures_question_set_keeps_order() {
        let set = question_set("s1", crate::models::domain::question::ContentStatus::Published, &["b", "a"]);
        assert_eq!(set.ordered_question_ids(), vec!["b".to_string(), "a".to_string()]);
    }

    #[test]
    fn test_fixtures_section_name() {
        let section = section("pu", 20, 1800);
        assert_eq!(section.name, "PU");
        assert_eq!(section.question_count, 20);
    }
}
