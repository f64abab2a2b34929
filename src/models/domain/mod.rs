pub mod answer;
pub mod attempt;
pub mod attempt_item;
pub mod blueprint;
pub mod question;
pub mod results;
pub use answer::{AnswerKey, QuestionType, UserAnswer};
pub use attempt::{
    Attempt, AttemptCompletion, AttemptMode, AttemptSession, AttemptStatus, SectionProgress,
    TimeMode,
};
pub use attempt_item::{AttemptItem, ItemAnswerUpdate};
pub use blueprint::{Blueprint, BlueprintSection};
pub use question::{ContentStatus, Question, QuestionSet, QuestionSetItem};
pub use results::{AttemptResults, SectionResults};
