use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, from_document},
    options::IndexOptions,
    Collection, IndexModel,
};

use crate::{
    db::Database,
    errors::AppResult,
    models::domain::question::{ContentStatus, Question},
};

/// Read-only access to question content and answer keys.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// Up to `limit` randomly chosen questions of one subtest and status.
    async fn find_random(
        &self,
        subtest_id: &str,
        status: ContentStatus,
        limit: u32,
    ) -> AppResult<Vec<Question>>;
    async fn find_by_id(&self, id: &str) -> AppResult<Option<Question>>;
    async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<Question>>;
}

pub struct MongoQuestionRepository {
    collection: Collection<Question>,
}

impl MongoQuestionRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.questions();
        Self { collection }
    }

    pub async fn ensure_indexes(&self) -> AppResult<()> {
        log::info!("Creating indexes for questions collection");

        let id_index = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("id_unique".to_string())
                    .build(),
            )
            .build();

        let subtest_index = IndexModel::builder()
            .keys(doc! { "subtest_id": 1, "status": 1 })
            .options(IndexOptions::builder().name("subtest_status".to_string()).build())
            .build();

        self.collection.create_index(id_index).await?;
        self.collection.create_index(subtest_index).await?;

        log::info!("Successfully created indexes for questions collection");
        Ok(())
    }
}

#[async_trait]
impl QuestionRepository for MongoQuestionRepository {
    async fn find_random(
        &self,
        subtest_id: &str,
        status: ContentStatus,
        limit: u32,
    ) -> AppResult<Vec<Question>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let pipeline = vec![
            doc! { "$match": { "subtest_id": subtest_id, "status": status.as_str() } },
            doc! { "$sample": { "size": limit as i64 } },
        ];

        let mut cursor = self.collection.aggregate(pipeline).await?;
        let mut questions = Vec::new();
        while let Some(document) = cursor.try_next().await? {
            questions.push(from_document::<Question>(document)?);
        }

        Ok(questions)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<Question>> {
        let question = self.collection.find_one(doc! { "id": id }).await?;
        Ok(question)
    }

    async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<Question>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let questions = self
            .collection
            .find(doc! { "id": { "$in": ids.to_vec() } })
            .await?
            .try_collect()
            .await?;
        Ok(questions)
    }
}
