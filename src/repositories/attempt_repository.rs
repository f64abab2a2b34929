use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, to_bson, Document},
    options::{IndexOptions, ReturnDocument},
    Collection, IndexModel,
};

use crate::{
    db::Database,
    errors::{AppError, AppResult},
    models::domain::{
        attempt::{Attempt, AttemptCompletion, AttemptStatus, SectionProgress},
        attempt_item::{AttemptItem, ItemAnswerUpdate},
    },
};

/// Durable store for attempts and their items. Holds no business rules.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AttemptRepository: Send + Sync {
    /// Persist an attempt together with all of its items, or nothing.
    async fn create_with_items(&self, attempt: Attempt, items: Vec<AttemptItem>) -> AppResult<()>;
    async fn find_by_id(&self, id: &str) -> AppResult<Option<Attempt>>;
    async fn find_by_user(
        &self,
        user_id: &str,
        offset: i64,
        limit: i64,
    ) -> AppResult<(Vec<Attempt>, i64)>;
    async fn find_item(&self, item_id: &str) -> AppResult<Option<AttemptItem>>;
    async fn list_items(&self, attempt_id: &str) -> AppResult<Vec<AttemptItem>>;
    async fn update_item_answer(
        &self,
        item_id: &str,
        update: ItemAnswerUpdate,
    ) -> AppResult<AttemptItem>;
    /// Replace the tryout progress only if it still equals `expected` and the
    /// attempt is in progress. Returns whether the swap happened.
    async fn update_progress(
        &self,
        attempt_id: &str,
        expected: &SectionProgress,
        next: &SectionProgress,
    ) -> AppResult<bool>;
    /// Mark the attempt completed with its results in one write, only if it
    /// is still in progress. Returns whether the write happened.
    async fn complete(&self, attempt_id: &str, completion: AttemptCompletion) -> AppResult<bool>;
}

pub struct MongoAttemptRepository {
    attempts: Collection<Attempt>,
    items: Collection<AttemptItem>,
}

impl MongoAttemptRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            attempts: db.attempts(),
            items: db.attempt_items(),
        }
    }

    pub async fn ensure_indexes(&self) -> AppResult<()> {
        log::info!("Creating indexes for attempts and attempt_items collections");

        let id_index = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("id_unique".to_string())
                    .build(),
            )
            .build();

        let user_index = IndexModel::builder()
            .keys(doc! { "user_id": 1, "started_at": -1 })
            .options(IndexOptions::builder().name("user_started".to_string()).build())
            .build();

        let item_id_index = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("id_unique".to_string())
                    .build(),
            )
            .build();

        let item_order_index = IndexModel::builder()
            .keys(doc! { "attempt_id": 1, "sort_order": 1 })
            .options(IndexOptions::builder().name("attempt_order".to_string()).build())
            .build();

        self.attempts.create_index(id_index).await?;
        self.attempts.create_index(user_index).await?;
        self.items.create_index(item_id_index).await?;
        self.items.create_index(item_order_index).await?;

        log::info!("Successfully created indexes for attempts and attempt_items collections");
        Ok(())
    }

    async fn discard_partial_creation(&self, attempt_id: &str) {
        if let Err(err) = self.items.delete_many(doc! { "attempt_id": attempt_id }).await {
            log::error!("Failed to remove items of partial attempt '{}': {}", attempt_id, err);
        }
        if let Err(err) = self.attempts.delete_one(doc! { "id": attempt_id }).await {
            log::error!("Failed to remove partial attempt '{}': {}", attempt_id, err);
        }
    }

    fn answer_update_document(update: &ItemAnswerUpdate) -> AppResult<Document> {
        let mut set = doc! {
            "user_answer": to_bson(&update.user_answer)?,
            "is_correct": to_bson(&update.is_correct)?,
            "partial_score": to_bson(&update.partial_score)?,
            "answered_at": to_bson(&update.answered_at)?,
        };
        if let Some(seconds) = update.time_spent_seconds {
            set.insert("time_spent_seconds", seconds);
        }
        Ok(doc! { "$set": set })
    }
}

#[async_trait]
impl AttemptRepository for MongoAttemptRepository {
    async fn create_with_items(&self, attempt: Attempt, items: Vec<AttemptItem>) -> AppResult<()> {
        self.attempts.insert_one(&attempt).await?;

        if items.is_empty() {
            return Ok(());
        }

        if let Err(err) = self.items.insert_many(&items).await {
            log::error!(
                "Failed to insert {} items for attempt '{}'; rolling back: {}",
                items.len(),
                attempt.id,
                err
            );
            self.discard_partial_creation(&attempt.id).await;
            return Err(err.into());
        }

        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<Attempt>> {
        let attempt = self.attempts.find_one(doc! { "id": id }).await?;
        Ok(attempt)
    }

    async fn find_by_user(
        &self,
        user_id: &str,
        offset: i64,
        limit: i64,
    ) -> AppResult<(Vec<Attempt>, i64)> {
        let filter = doc! { "user_id": user_id };

        let total = self.attempts.count_documents(filter.clone()).await?;

        let attempts = self
            .attempts
            .find(filter)
            .sort(doc! { "started_at": -1 })
            .skip(offset.max(0) as u64)
            .limit(limit)
            .await?
            .try_collect()
            .await?;

        Ok((attempts, total as i64))
    }

    async fn find_item(&self, item_id: &str) -> AppResult<Option<AttemptItem>> {
        let item = self.items.find_one(doc! { "id": item_id }).await?;
        Ok(item)
    }

    async fn list_items(&self, attempt_id: &str) -> AppResult<Vec<AttemptItem>> {
        let items = self
            .items
            .find(doc! { "attempt_id": attempt_id })
            .sort(doc! { "sort_order": 1 })
            .await?
            .try_collect()
            .await?;
        Ok(items)
    }

    async fn update_item_answer(
        &self,
        item_id: &str,
        update: ItemAnswerUpdate,
    ) -> AppResult<AttemptItem> {
        let update_doc = Self::answer_update_document(&update)?;

        self.items
            .find_one_and_update(doc! { "id": item_id }, update_doc)
            .return_document(ReturnDocument::After)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Attempt item with id '{}' not found", item_id)))
    }

    async fn update_progress(
        &self,
        attempt_id: &str,
        expected: &SectionProgress,
        next: &SectionProgress,
    ) -> AppResult<bool> {
        let filter = doc! {
            "id": attempt_id,
            "status": AttemptStatus::InProgress.as_str(),
            "session.progress": to_bson(expected)?,
        };
        let update = doc! { "$set": { "session.progress": to_bson(next)? } };

        let result = self.attempts.update_one(filter, update).await?;
        Ok(result.matched_count == 1)
    }

    async fn complete(&self, attempt_id: &str, completion: AttemptCompletion) -> AppResult<bool> {
        let filter = doc! {
            "id": attempt_id,
            "status": AttemptStatus::InProgress.as_str(),
        };
        let update = doc! {
            "$set": {
                "status": AttemptStatus::Completed.as_str(),
                "completed_at": to_bson(&completion.completed_at)?,
                "total_time_seconds": completion.total_time_seconds,
                "results": to_bson(&completion.results)?,
            }
        };

        let result = self.attempts.update_one(filter, update).await?;
        Ok(result.matched_count == 1)
    }
}
