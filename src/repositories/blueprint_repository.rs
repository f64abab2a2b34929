use async_trait::async_trait;
use mongodb::{bson::doc, options::IndexOptions, Collection, IndexModel};

use crate::{db::Database, errors::AppResult, models::domain::blueprint::Blueprint};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BlueprintRepository: Send + Sync {
    async fn find_with_sections(&self, id: &str) -> AppResult<Option<Blueprint>>;
}

pub struct MongoBlueprintRepository {
    collection: Collection<Blueprint>,
}

impl MongoBlueprintRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.blueprints();
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
        log::info!("Successfully created indexes for blueprints collection");
        Ok(())
    }
}

#[async_trait]
impl BlueprintRepository for MongoBlueprintRepository {
    async fn find_with_sections(&self, id: &str) -> AppResult<Option<Blueprint>> {
        let blueprint = self.collection.find_one(doc! { "id": id }).await?;
        Ok(blueprint)
    }
}
