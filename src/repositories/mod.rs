pub mod attempt_repository;
pub mod blueprint_repository;
pub mod memory;
pub mod question_repository;
pub mod question_set_repository;

pub use attempt_repository::{AttemptRepository, MongoAttemptRepository};
pub use blueprint_repository::{BlueprintRepository, MongoBlueprintRepository};
pub use question_repository::{MongoQuestionRepository, QuestionRepository};
pub use question_set_repository::{MongoQuestionSetRepository, QuestionSetRepository};
