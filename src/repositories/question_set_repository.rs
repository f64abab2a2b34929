use async_trait::async_trait;
use mongodb::{bson::doc, options::IndexOptions, Collection, IndexModel};

use crate::{db::Database, errors::AppResult, models::domain::question::QuestionSet};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuestionSetRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> AppResult<Option<QuestionSet>>;
}

pub struct MongoQuestionSetRepository {
    collection: Collection<QuestionSet>,
}

impl MongoQuestionSetRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.question_sets();
        Self { collection }
    }

    pub async fn ensure_indexes(&self) -> AppResult<()> {
        let id_index = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("id_unique".to_string())
                    .build(),
            )
            .build();

        self.collection.create_index(id_index).await?;
        log::info!("Successfully created indexes for question_sets collection");
        Ok(())
    }
}

#[async_trait]
impl QuestionSetRepository for MongoQuestionSetRepository {
    async fn find_by_id(&self, id: &str) -> AppResult<Option<QuestionSet>> {
        let set = self.collection.find_one(doc! { "id": id }).await?;
        Ok(set)
    }
}
