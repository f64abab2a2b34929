//! In-process repositories backed by `tokio::sync::RwLock` maps. Used by the
//! test suites and for running the engine without MongoDB.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    errors::{AppError, AppResult},
    models::domain::{
        attempt::{Attempt, AttemptCompletion, AttemptSession, AttemptStatus, SectionProgress},
        attempt_item::{AttemptItem, ItemAnswerUpdate},
        blueprint::Blueprint,
        question::{ContentStatus, Question, QuestionSet},
    },
    repositories::{AttemptRepository, BlueprintRepository, QuestionRepository, QuestionSetRepository},
};

#[derive(Default)]
pub struct InMemoryAttemptRepository {
    attempts: Arc<RwLock<HashMap<String, Attempt>>>,
    items: Arc<RwLock<HashMap<String, AttemptItem>>>,
    completion_writes: AtomicUsize,
}

impl InMemoryAttemptRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of completion updates that were actually applied.
    pub fn completion_writes(&self) -> usize {
        self.completion_writes.load(Ordering::SeqCst)
    }

    pub async fn attempt_count(&self) -> usize {
        self.attempts.read().await.len()
    }

    pub async fn item_count(&self) -> usize {
        self.items.read().await.len()
    }
}

#[async_trait]
impl AttemptRepository for InMemoryAttemptRepository {
    async fn create_with_items(&self, attempt: Attempt, items: Vec<AttemptItem>) -> AppResult<()> {
        // Lock order: attempts, then items.
        let mut attempts = self.attempts.write().await;
        let mut stored_items = self.items.write().await;

        if attempts.contains_key(&attempt.id) {
            return Err(AppError::AlreadyExists(format!(
                "Attempt with id '{}' already exists",
                attempt.id
            )));
        }
        if let Some(duplicate) = items.iter().find(|item| stored_items.contains_key(&item.id)) {
            return Err(AppError::AlreadyExists(format!(
                "Attempt item with id '{}' already exists",
                duplicate.id
            )));
        }

        for item in items {
            stored_items.insert(item.id.clone(), item);
        }
        attempts.insert(attempt.id.clone(), attempt);
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<Attempt>> {
        let attempts = self.attempts.read().await;
        Ok(attempts.get(id).cloned())
    }

    async fn find_by_user(
        &self,
        user_id: &str,
        offset: i64,
        limit: i64,
    ) -> AppResult<(Vec<Attempt>, i64)> {
        let attempts = self.attempts.read().await;
        let mut items: Vec<_> = attempts
            .values()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| b.started_at.cmp(&a.started_at));

        let total = items.len() as i64;
        let start = offset.max(0) as usize;
        let end = (start + limit.max(0) as usize).min(items.len());

        let page = if start >= items.len() {
            vec![]
        } else {
            items[start..end].to_vec()
        };

        Ok((page, total))
    }

    async fn find_item(&self, item_id: &str) -> AppResult<Option<AttemptItem>> {
        let items = self.items.read().await;
        Ok(items.get(item_id).cloned())
    }

    async fn list_items(&self, attempt_id: &str) -> AppResult<Vec<AttemptItem>> {
        let items = self.items.read().await;
        let mut found: Vec<_> = items
            .values()
            .filter(|item| item.attempt_id == attempt_id)
            .cloned()
            .collect();
        found.sort_by_key(|item| item.sort_order);
        Ok(found)
    }

    async fn update_item_answer(
        &self,
        item_id: &str,
        update: ItemAnswerUpdate,
    ) -> AppResult<AttemptItem> {
        let mut items = self.items.write().await;
        let item = items
            .get_mut(item_id)
            .ok_or_else(|| AppError::NotFound(format!("Attempt item with id '{}' not found", item_id)))?;

        update.apply_to(item);
        Ok(item.clone())
    }

    async fn update_progress(
        &self,
        attempt_id: &str,
        expected: &SectionProgress,
        next: &SectionProgress,
    ) -> AppResult<bool> {
        let mut attempts = self.attempts.write().await;
        let Some(attempt) = attempts.get_mut(attempt_id) else {
            return Ok(false);
        };
        if attempt.status != AttemptStatus::InProgress {
            return Ok(false);
        }

        match &mut attempt.session {
            AttemptSession::Tryout { progress, .. } if *progress == *expected => {
                *progress = *next;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn complete(&self, attempt_id: &str, completion: AttemptCompletion) -> AppResult<bool> {
        let mut attempts = self.attempts.write().await;
        let Some(attempt) = attempts.get_mut(attempt_id) else {
            return Ok(false);
        };
        if attempt.status != AttemptStatus::InProgress {
            return Ok(false);
        }

        attempt.status = AttemptStatus::Completed;
        attempt.completed_at = Some(completion.completed_at);
        attempt.total_time_seconds = Some(completion.total_time_seconds);
        attempt.results = Some(completion.results);
        self.completion_writes.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }
}

/// Questions are returned in insertion order; `find_random` takes the first
/// matches so tests stay deterministic.
#[derive(Default)]
pub struct InMemoryQuestionRepository {
    questions: Arc<RwLock<Vec<Question>>>,
}

impl InMemoryQuestionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_questions(questions: Vec<Question>) -> Self {
        Self {
            questions: Arc::new(RwLock::new(questions)),
        }
    }

    pub async fn insert(&self, question: Question) {
        self.questions.write().await.push(question);
    }
}

#[async_trait]
impl QuestionRepository for InMemoryQuestionRepository {
    async fn find_random(
        &self,
        subtest_id: &str,
        status: ContentStatus,
        limit: u32,
    ) -> AppResult<Vec<Question>> {
        let questions = self.questions.read().await;
        Ok(questions
            .iter()
            .filter(|q| q.subtest_id == subtest_id && q.status == status)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<Question>> {
        let questions = self.questions.read().await;
        Ok(questions.iter().find(|q| q.id == id).cloned())
    }

    async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<Question>> {
        let questions = self.questions.read().await;
        Ok(questions
            .iter()
            .filter(|q| ids.contains(&q.id))
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct InMemoryBlueprintRepository {
    blueprints: Arc<RwLock<HashMap<String, Blueprint>>>,
}

impl InMemoryBlueprintRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, blueprint: Blueprint) {
        self.blueprints
            .write()
            .await
            .insert(blueprint.id.clone(), blueprint);
    }
}

#[async_trait]
impl BlueprintRepository for InMemoryBlueprintRepository {
    async fn find_with_sections(&self, id: &str) -> AppResult<Option<Blueprint>> {
        let blueprints = self.blueprints.read().await;
        Ok(blueprints.get(id).cloned())
    }
}

#[derive(Default)]
pub struct InMemoryQuestionSetRepository {
    sets: Arc<RwLock<HashMap<String, QuestionSet>>>,
}

impl InMemoryQuestionSetRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, set: QuestionSet) {
        self.sets.write().await.insert(set.id.clone(), set);
    }
}

#[async_trait]
impl QuestionSetRepository for InMemoryQuestionSetRepository {
    async fn find_by_id(&self, id: &str) -> AppResult<Option<QuestionSet>> {
        let sets = self.sets.read().await;
        Ok(sets.get(id).cloned())
    }
}
