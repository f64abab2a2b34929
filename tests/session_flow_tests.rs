use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};

use exam_session_server::{
    config::ExamPolicy,
    errors::AppError,
    models::domain::{
        AnswerKey, AttemptMode, Blueprint, BlueprintSection, ContentStatus, Question, UserAnswer,
    },
    repositories::{
        memory::{
            InMemoryAttemptRepository, InMemoryBlueprintRepository, InMemoryQuestionRepository,
            InMemoryQuestionSetRepository,
        },
        AttemptRepository,
    },
    services::{attempt_session_service::AttemptSessionService, section_clock::ManualClock},
};

const STUDENT: &str = "student-42";

struct Engine {
    attempts: Arc<InMemoryAttemptRepository>,
    clock: Arc<ManualClock>,
    service: Arc<AttemptSessionService>,
}

fn opening_bell() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, 10, 7, 30, 0).unwrap()
}

fn question(id: &str, subtest_id: &str, correct: &str) -> Question {
    Question {
        id: id.to_string(),
        subtest_id: subtest_id.to_string(),
        status: ContentStatus::Published,
        answer_key: AnswerKey::SingleChoice {
            correct: correct.to_string(),
        },
    }
}

/// Two sections: A has 2 questions and 60s, B has 1 question and 30s.
async fn two_section_engine() -> Engine {
    let attempts = Arc::new(InMemoryAttemptRepository::new());
    let clock = Arc::new(ManualClock::new(opening_bell()));
    let questions = InMemoryQuestionRepository::with_questions(vec![
        question("a-1", "subtest-a", "A"),
        question("a-2", "subtest-a", "C"),
        question("b-1", "subtest-b", "D"),
    ]);
    let blueprints = InMemoryBlueprintRepository::new();
    blueprints
        .insert(Blueprint {
            id: "bp-mini".to_string(),
            name: "Mini tryout".to_string(),
            is_active: true,
            sections: vec![
                BlueprintSection {
                    subtest_id: "subtest-a".to_string(),
                    name: "Section A".to_string(),
                    question_count: 2,
                    duration_seconds: 60,
                },
                BlueprintSection {
                    subtest_id: "subtest-b".to_string(),
                    name: "Section B".to_string(),
                    question_count: 1,
                    duration_seconds: 30,
                },
            ],
        })
        .await;

    let service = Arc::new(AttemptSessionService::new(
        attempts.clone(),
        Arc::new(questions),
        Arc::new(blueprints),
        Arc::new(InMemoryQuestionSetRepository::new()),
        clock.clone(),
        ExamPolicy::default(),
    ));

    Engine {
        attempts,
        clock,
        service,
    }
}

async fn item_id(engine: &Engine, attempt_id: &str, question_id: &str) -> String {
    engine
        .attempts
        .list_items(attempt_id)
        .await
        .unwrap()
        .into_iter()
        .find(|item| item.question_id == question_id)
        .map(|item| item.id)
        .expect("question should be part of the attempt")
}

async fn answer(engine: &Engine, attempt_id: &str, question_id: &str, selected: Option<&str>) -> Result<(), AppError> {
    let item_id = item_id(engine, attempt_id, question_id).await;
    engine
        .service
        .submit_answer(
            attempt_id,
            &item_id,
            UserAnswer::SingleChoice {
                selected: selected.map(str::to_string),
            },
            Some(10),
            STUDENT,
            AttemptMode::Tryout,
        )
        .await
        .map(|_| ())
}

#[tokio::test]
async fn full_tryout_produces_per_section_results() {
    let engine = two_section_engine().await;
    let attempt_id = engine.service.create_tryout_session("bp-mini", STUDENT).await.unwrap();

    engine.service.start_section(&attempt_id, 0, STUDENT).await.unwrap();
    answer(&engine, &attempt_id, "a-1", Some("A")).await.unwrap();
    answer(&engine, &attempt_id, "a-2", None).await.unwrap();
    engine.clock.advance(Duration::seconds(45));

    let first_end = engine.service.end_section(&attempt_id, 0, STUDENT).await.unwrap();
    assert!(!first_end.is_completed);
    assert_eq!(first_end.next_section_index, Some(1));

    engine.service.start_section(&attempt_id, 1, STUDENT).await.unwrap();
    answer(&engine, &attempt_id, "b-1", Some("D")).await.unwrap();

    let last_end = engine.service.end_section(&attempt_id, 1, STUDENT).await.unwrap();
    assert!(last_end.is_completed);

    let results = engine.service.finalize(&attempt_id, STUDENT).await.unwrap();
    assert_eq!(results.total_questions, 3);
    assert_eq!(results.correct_count, 2);
    assert_eq!(results.blank_count, 1);
    assert_eq!(results.accuracy, 66.67);

    let sections = results.per_section.expect("tryout results are split by section");
    assert_eq!((sections[0].correct_count, sections[0].total_questions), (1, 2));
    assert_eq!((sections[1].correct_count, sections[1].total_questions), (1, 1));
}

#[tokio::test]
async fn late_answer_is_refused_by_the_server_clock() {
    let engine = two_section_engine().await;
    let attempt_id = engine.service.create_tryout_session("bp-mini", STUDENT).await.unwrap();
    engine.service.start_section(&attempt_id, 0, STUDENT).await.unwrap();

    engine.clock.advance(Duration::seconds(61));
    let late = answer(&engine, &attempt_id, "a-1", Some("A")).await;
    assert!(matches!(late, Err(AppError::SectionExpired(_))));

    // Ending an expired section is still allowed so the student can move on.
    let ended = engine.service.end_section(&attempt_id, 0, STUDENT).await.unwrap();
    assert_eq!(ended.next_section_index, Some(1));
}

#[tokio::test]
async fn early_finish_counts_remaining_items_as_blank() {
    let engine = two_section_engine().await;
    let attempt_id = engine.service.create_tryout_session("bp-mini", STUDENT).await.unwrap();
    engine.service.start_section(&attempt_id, 0, STUDENT).await.unwrap();
    answer(&engine, &attempt_id, "a-2", Some("B")).await.unwrap();

    let results = engine.service.finalize(&attempt_id, STUDENT).await.unwrap();

    assert_eq!(results.wrong_count, 1);
    assert_eq!(results.blank_count, 2);
    assert_eq!(results.correct_count, 0);
}

#[tokio::test]
async fn concurrent_finalize_writes_results_once() {
    let engine = two_section_engine().await;
    let attempt_id = engine.service.create_tryout_session("bp-mini", STUDENT).await.unwrap();
    engine.service.start_section(&attempt_id, 0, STUDENT).await.unwrap();
    answer(&engine, &attempt_id, "a-1", Some("A")).await.unwrap();

    let first = {
        let service = engine.service.clone();
        let attempt_id = attempt_id.clone();
        tokio::spawn(async move { service.finalize(&attempt_id, STUDENT).await })
    };
    let second = {
        let service = engine.service.clone();
        let attempt_id = attempt_id.clone();
        tokio::spawn(async move { service.finalize(&attempt_id, STUDENT).await })
    };

    let first = first.await.unwrap().unwrap();
    let second = second.await.unwrap().unwrap();

    assert_eq!(first, second);
    assert_eq!(engine.attempts.completion_writes(), 1);
}

#[tokio::test]
async fn concurrent_section_starts_share_one_start_time() {
    let engine = two_section_engine().await;
    let attempt_id = engine.service.create_tryout_session("bp-mini", STUDENT).await.unwrap();

    let (left, right) = tokio::join!(
        engine.service.start_section(&attempt_id, 0, STUDENT),
        engine.service.start_section(&attempt_id, 0, STUDENT),
    );

    let left = left.unwrap();
    let right = right.unwrap();
    assert_eq!(left.section_started_at, right.section_started_at);
    assert_eq!(left.remaining_seconds, 60);
}

#[tokio::test]
async fn reload_after_disconnect_resumes_the_same_clock() {
    let engine = two_section_engine().await;
    let attempt_id = engine.service.create_tryout_session("bp-mini", STUDENT).await.unwrap();
    engine.service.start_section(&attempt_id, 0, STUDENT).await.unwrap();

    engine.clock.advance(Duration::seconds(25));
    let resumed = engine.service.start_section(&attempt_id, 0, STUDENT).await.unwrap();
    assert_eq!(resumed.section_started_at, opening_bell());
    assert_eq!(resumed.remaining_seconds, 35);

    let detail = engine.service.get_attempt(&attempt_id, STUDENT).await.unwrap();
    let timer = detail.timer.expect("running section exposes its timer");
    assert_eq!(timer.remaining_seconds, 35);
}
