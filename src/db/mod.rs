use std::time::Duration;

use mongodb::{
    bson::doc,
    options::{ClientOptions, ServerApi, ServerApiVersion},
    Client, Collection,
};

use crate::{
    config::Config,
    errors::AppResult,
    models::domain::{
        attempt::Attempt, attempt_item::AttemptItem, blueprint::Blueprint,
        question::{Question, QuestionSet},
    },
};

pub const ATTEMPTS: &str = "attempts";
pub const ATTEMPT_ITEMS: &str = "attempt_items";
pub const QUESTIONS: &str = "questions";
pub const BLUEPRINTS: &str = "blueprints";
pub const QUESTION_SETS: &str = "question_sets";

/// Handle on the exam database. Attempts and their items are written here;
/// questions, blueprints and sets are only read.
#[derive(Clone)]
pub struct Database {
    client: Client,
    db_name: String,
}

impl Database {
    pub async fn connect(config: &Config) -> AppResult<Self> {
        let pool = &config.mongo;
        let timeout = Duration::from_secs(pool.timeout_seconds);

        let mut client_options = ClientOptions::parse(&config.mongo_conn_string).await?;
        client_options.server_api = Some(ServerApi::builder().version(ServerApiVersion::V1).build());
        client_options.app_name = Some(env!("CARGO_PKG_NAME").to_string());
        client_options.max_pool_size = Some(pool.max_pool_size);
        client_options.min_pool_size = Some(pool.min_pool_size);
        client_options.connect_timeout = Some(timeout);
        client_options.server_selection_timeout = Some(timeout);

        let database = Self {
            client: Client::with_options(client_options)?,
            db_name: config.mongo_db_name.clone(),
        };
        database.health_check().await?;

        log::info!(
            "Connected to exam database '{}' (pool {}..{})",
            database.db_name,
            pool.min_pool_size,
            pool.max_pool_size
        );
        Ok(database)
    }

    pub fn attempts(&self) -> Collection<Attempt> {
        self.collection(ATTEMPTS)
    }

    pub fn attempt_items(&self) -> Collection<AttemptItem> {
        self.collection(ATTEMPT_ITEMS)
    }

    pub fn questions(&self) -> Collection<Question> {
        self.collection(QUESTIONS)
    }

    pub fn blueprints(&self) -> Collection<Blueprint> {
        self.collection(BLUEPRINTS)
    }

    pub fn question_sets(&self) -> Collection<QuestionSet> {
        self.collection(QUESTION_SETS)
    }

    /// Readiness ping used at startup and by `/health/ready`.
    pub async fn health_check(&self) -> AppResult<()> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await?;
        Ok(())
    }

    pub fn db_name(&self) -> &str {
        &self.db_name
    }

    fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        self.client.database(&self.db_name).collection(name)
    }
}
