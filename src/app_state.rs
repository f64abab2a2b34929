use std::sync::Arc;

use crate::{
    config::Config,
    db::Database,
    errors::AppResult,
    repositories::{
        AttemptRepository, BlueprintRepository, MongoAttemptRepository, MongoBlueprintRepository,
        MongoQuestionRepository, MongoQuestionSetRepository, QuestionRepository, QuestionSetRepository,
    },
    services::{
        attempt_session_service::AttemptSessionService,
        section_clock::{Clock, SystemClock},
    },
};

#[derive(Clone)]
pub struct AppState {
    pub session_service: Arc<AttemptSessionService>,
    pub config: Arc<Config>,
    /// Absent when the state is built over in-memory repositories.
    pub db: Option<Database>,
}

impl AppState {
    pub async fn new(config: Config) -> AppResult<Self> {
        let db = Database::connect(&config).await?;

        let attempt_repository = Arc::new(MongoAttemptRepository::new(&db));
        attempt_repository.ensure_indexes().await?;
        let question_repository = Arc::new(MongoQuestionRepository::new(&db));
        question_repository.ensure_indexes().await?;
        let blueprint_repository = Arc::new(MongoBlueprintRepository::new(&db));
        blueprint_repository.ensure_indexes().await?;
        let question_set_repository = Arc::new(MongoQuestionSetRepository::new(&db));
        question_set_repository.ensure_indexes().await?;

        let session_service = Arc::new(AttemptSessionService::new(
            attempt_repository,
            question_repository,
            blueprint_repository,
            question_set_repository,
            Arc::new(SystemClock),
            config.policy.clone(),
        ));

        log::info!("Application state ready on database '{}'", db.db_name());

        Ok(Self {
            session_service,
            config: Arc::new(config),
            db: Some(db),
        })
    }

    /// Wire the state from already-built repositories, without a database.
    pub fn from_parts(
        config: Config,
        attempts: Arc<dyn AttemptRepository>,
        questions: Arc<dyn QuestionRepository>,
        blueprints: Arc<dyn BlueprintRepository>,
        question_sets: Arc<dyn QuestionSetRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let session_service = Arc::new(AttemptSessionService::new(
            attempts,
            questions,
            blueprints,
            question_sets,
            clock,
            config.policy.clone(),
        ));

        Self {
            session_service,
            config: Arc::new(config),
            db: None,
        }
    }
}
